//! Reproducibility statistics over the measurement matrix.

use panel_model::columns::sample;
use panel_model::frame::column_strings;
use panel_model::{AssayRole, Dataset, PanelError, Result, SampleType};

/// Percentage RSD per feature over precision-reference pool samples.
///
/// Restricted to currently-masked samples classified as
/// `AssayRole::PrecisionReference` and `SampleType::StudyPool`. The fallback
/// reproducibility metric when no expected concentrations are known.
pub fn rsd_sp(dataset: &Dataset) -> Result<Vec<f64>> {
    rsd_for(dataset, AssayRole::PrecisionReference, SampleType::StudyPool)
}

/// Percentage RSD per feature over study samples.
pub fn rsd_ss(dataset: &Dataset) -> Result<Vec<f64>> {
    rsd_for(dataset, AssayRole::Assay, SampleType::StudySample)
}

fn rsd_for(dataset: &Dataset, role: AssayRole, sample_type: SampleType) -> Result<Vec<f64>> {
    let rows = qualifying_rows(dataset, role, sample_type)?;
    if rows.len() < 2 {
        return Err(PanelError::Domain(format!(
            "more than one {} / {} sample is required to calculate RSDs, found {}",
            role,
            sample_type,
            rows.len()
        )));
    }

    let mut out = Vec::with_capacity(dataset.n_features());
    for j in 0..dataset.n_features() {
        let values: Vec<f64> = rows.iter().map(|&i| dataset.intensity[[i, j]]).collect();
        out.push(percent_rsd(&values));
    }
    Ok(out)
}

/// Row indices of masked-in samples with the given classification.
fn qualifying_rows(
    dataset: &Dataset,
    role: AssayRole,
    sample_type: SampleType,
) -> Result<Vec<usize>> {
    let missing_columns = |_| {
        PanelError::Domain(
            "assay roles and sample types must be defined to calculate RSDs".to_string(),
        )
    };
    let roles = column_strings(&dataset.sample_metadata, "sampleMetadata", sample::ASSAY_ROLE)
        .map_err(missing_columns)?;
    let types = column_strings(&dataset.sample_metadata, "sampleMetadata", sample::SAMPLE_TYPE)
        .map_err(missing_columns)?;

    Ok((0..dataset.n_samples())
        .filter(|&i| {
            dataset.sample_mask[i]
                && roles[i].parse::<AssayRole>() == Ok(role)
                && types[i].parse::<SampleType>() == Ok(sample_type)
        })
        .collect())
}

/// Sample standard deviation (n-1) over the mean, as a percentage.
///
/// Censoring sentinels and missing values propagate into a non-finite
/// result, which downstream threshold comparisons treat as failing.
fn percent_rsd(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt() / mean * 100.0
}
