//! Limit-of-quantification censoring.
//!
//! Replaces matrix entries outside their quantifiable range with the
//! censoring sentinels. Exports render the sentinels as the `<LLOQ` /
//! `>ULOQ` tokens, so the decision survives a round trip even though the
//! original numeric value does not.

use tracing::{info, warn};

use panel_model::columns::feature;
use panel_model::frame::{column_f64s, column_strings};
use panel_model::{
    ABOVE_LOQ, BELOW_LOQ, CalibrationMethod, Dataset, PanelError, QuantificationType, Result,
};

/// Switches for a censoring pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CensorOptions {
    /// Only apply the lower limit; leave values above the ULOQ untouched.
    pub only_lloq: bool,
}

/// Censor the intensity matrix against the per-(sample, feature) detection
/// limits, feature by feature.
///
/// Entries strictly below their limit become [`BELOW_LOQ`]; with an upper
/// limit configured for the feature (a finite `ULOQ`) and `only_lloq` unset,
/// entries strictly above it become [`ABOVE_LOQ`]. Features monitored for
/// relative information, or carrying no calibration, are exempt and passed
/// through unchanged; their names are returned. Calibration-standard data is
/// never censored.
///
/// Fails with a configuration error when the dataset carries no
/// limit-of-detection matrix.
pub fn apply_limits_of_quantification(
    dataset: &mut Dataset,
    options: &CensorOptions,
) -> Result<Vec<String>> {
    let Some(lod) = dataset.lod.clone() else {
        return Err(PanelError::Config(
            "no limit-of-detection data available".to_string(),
        ));
    };
    dataset.check_shape_invariants()?;

    let quant_types = column_strings(
        &dataset.feature_metadata,
        "featureMetadata",
        feature::QUANTIFICATION_TYPE,
    )?;
    let calibration_methods = column_strings(
        &dataset.feature_metadata,
        "featureMetadata",
        feature::CALIBRATION_METHOD,
    )?;
    let names = dataset.feature_names()?;
    let uloq = match column_f64s(&dataset.feature_metadata, "featureMetadata", feature::ULOQ) {
        Ok(values) => values,
        // No upper-limit column means no upper censoring; not an error.
        Err(_) => vec![None; dataset.n_features()],
    };

    let exempt: Vec<bool> = (0..dataset.n_features())
        .map(|j| {
            quant_types[j].parse::<QuantificationType>() == Ok(QuantificationType::Monitored)
                || calibration_methods[j].parse::<CalibrationMethod>()
                    == Ok(CalibrationMethod::NoCalibration)
        })
        .collect();
    let exempted: Vec<String> = names
        .iter()
        .zip(&exempt)
        .filter(|(_, &e)| e)
        .map(|(name, _)| name.clone())
        .collect();
    if !exempted.is_empty() {
        warn!(
            "features exempt from censoring (estimate only / no calibration): {}",
            exempted.join(", ")
        );
    }

    let mut below = 0usize;
    let mut above = 0usize;
    for j in 0..dataset.n_features() {
        if exempt[j] {
            continue;
        }
        let upper = uloq[j].filter(|u| u.is_finite());
        for i in 0..dataset.n_samples() {
            let value = dataset.intensity[[i, j]];
            if value.is_nan() {
                continue;
            }
            if value < lod[[i, j]] {
                dataset.intensity[[i, j]] = BELOW_LOQ;
                below += 1;
            } else if !options.only_lloq
                && let Some(upper) = upper
                && value > upper
            {
                dataset.intensity[[i, j]] = ABOVE_LOQ;
                above += 1;
            }
        }
    }

    info!(
        "limits of quantification applied: {below} value(s) replaced by {}, {above} by {}",
        panel_model::BELOW_LOQ_TOKEN,
        panel_model::ABOVE_LOQ_TOKEN
    );
    dataset.push_log(format!(
        "Limits of quantification applied ({} samples, {} features): {below} value(s) < LOD, {above} value(s) > ULOQ, {} feature(s) exempt",
        dataset.n_samples(),
        dataset.n_features(),
        exempted.len()
    ));
    Ok(exempted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use panel_model::Attributes;
    use polars::df;

    fn censored_dataset(lod: Option<ndarray::Array2<f64>>) -> Dataset {
        let intensity = array![[7.0, 7.0], [120.0, 12.0]];
        let samples = df!(
            "Sample File Name" => &["s1", "s2"],
        )
        .unwrap();
        let features = df!(
            "Feature Name" => &["alanine", "tsp"],
            "quantificationType" => &[
                "Quantified with IS",
                "Monitored for relative information",
            ],
            "calibrationMethod" => &[
                "Backcalculated with Internal Standard",
                "No calibration",
            ],
            "Unit" => &["µM", "-"],
            "LLOQ" => &[10.0, f64::NAN],
            "ULOQ" => &[100.0, f64::NAN],
        )
        .unwrap();
        Dataset::new("censor", intensity, samples, features, lod, Attributes::default()).unwrap()
    }

    #[test]
    fn values_below_lod_become_the_lower_sentinel() {
        let lod = array![[10.0, 10.0], [10.0, 10.0]];
        let mut dataset = censored_dataset(Some(lod));
        let exempt = apply_limits_of_quantification(&mut dataset, &CensorOptions::default())
            .unwrap();

        assert_eq!(dataset.intensity[[0, 0]], BELOW_LOQ);
        assert_eq!(dataset.intensity[[1, 0]], ABOVE_LOQ);
        // Monitored feature untouched even though 7 < 10.
        assert_eq!(dataset.intensity[[0, 1]], 7.0);
        assert_eq!(dataset.intensity[[1, 1]], 12.0);
        assert_eq!(exempt, vec!["tsp".to_string()]);
    }

    #[test]
    fn only_lloq_leaves_high_values_alone() {
        let lod = array![[10.0, 10.0], [10.0, 10.0]];
        let mut dataset = censored_dataset(Some(lod));
        apply_limits_of_quantification(&mut dataset, &CensorOptions { only_lloq: true }).unwrap();
        assert_eq!(dataset.intensity[[1, 0]], 120.0);
    }

    #[test]
    fn missing_lod_matrix_is_a_configuration_error() {
        let mut dataset = censored_dataset(None);
        let err = apply_limits_of_quantification(&mut dataset, &CensorOptions::default())
            .unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }

    #[test]
    fn censoring_is_idempotent() {
        let lod = array![[10.0, 10.0], [10.0, 10.0]];
        let mut dataset = censored_dataset(Some(lod));
        apply_limits_of_quantification(&mut dataset, &CensorOptions::default()).unwrap();
        let first = dataset.intensity.clone();
        apply_limits_of_quantification(&mut dataset, &CensorOptions::default()).unwrap();
        assert_eq!(dataset.intensity, first);
    }
}
