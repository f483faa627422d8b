//! QC mask filtering.
//!
//! Filtering only ever narrows the masks: every update is ANDed onto the
//! existing vectors, so an item excluded once stays excluded until
//! [`Dataset::reset_masks`] is called explicitly.

use tracing::debug;

use panel_model::columns::{feature, sample};
use panel_model::frame::column_strings;
use panel_model::{
    AssayRole, Dataset, PanelError, QuantificationType, Result, SampleType,
};

use crate::stats::rsd_sp;

/// Declarative filter criteria for [`update_masks`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaskFilter {
    /// Leave the sample mask untouched when false.
    pub filter_samples: bool,
    /// Leave the feature mask untouched when false.
    pub filter_features: bool,
    /// Sample types retained in analysis.
    pub sample_types: Vec<SampleType>,
    /// Assay roles retained in analysis.
    pub assay_roles: Vec<AssayRole>,
    /// Quantification types retained in analysis.
    pub quantification_types: Vec<QuantificationType>,
    /// Maximum precision-reference RSD per feature; falls back to the
    /// dataset attributes when unset.
    pub rsd_threshold: Option<f64>,
}

impl Default for MaskFilter {
    fn default() -> Self {
        Self {
            filter_samples: true,
            filter_features: true,
            sample_types: vec![SampleType::StudySample, SampleType::StudyPool],
            assay_roles: vec![AssayRole::Assay, AssayRole::PrecisionReference],
            quantification_types: QuantificationType::all().to_vec(),
            rsd_threshold: None,
        }
    }
}

/// Narrow the dataset masks according to QC criteria.
///
/// Sample inclusion requires the sample's type and role to be in the allowed
/// sets; feature inclusion requires an allowed quantification type and, when
/// an RSD threshold applies, a precision-reference RSD at or below it. Both
/// updates AND onto the existing masks.
///
/// Fail-fast: criteria are checked and every required column read (and the
/// RSD vector computed) before either mask is written, so a failing call
/// mutates nothing.
pub fn update_masks(dataset: &mut Dataset, filter: &MaskFilter) -> Result<()> {
    if !filter.filter_samples && !filter.filter_features {
        return Ok(());
    }
    if filter.filter_samples && (filter.sample_types.is_empty() || filter.assay_roles.is_empty()) {
        return Err(PanelError::Config(
            "sampleTypes and assayRoles must be non-empty lists".to_string(),
        ));
    }
    if filter.filter_features && filter.quantification_types.is_empty() {
        return Err(PanelError::Config(
            "quantificationTypes must be a non-empty list".to_string(),
        ));
    }

    let new_feature_mask = if filter.filter_features {
        let quant_types = column_strings(
            &dataset.feature_metadata,
            "featureMetadata",
            feature::QUANTIFICATION_TYPE,
        )?;
        let mut mask: Vec<bool> = quant_types
            .iter()
            .map(|value| {
                value
                    .parse::<QuantificationType>()
                    .map(|qt| filter.quantification_types.contains(&qt))
                    .unwrap_or(false)
            })
            .collect();

        let threshold = filter.rsd_threshold.or(dataset.attributes.rsd_threshold);
        if let Some(threshold) = threshold {
            // Computed against the pre-update sample mask.
            let rsds = rsd_sp(dataset)?;
            for (flag, rsd) in mask.iter_mut().zip(rsds) {
                *flag &= rsd <= threshold;
            }
        }
        Some(mask)
    } else {
        None
    };

    let new_sample_mask = if filter.filter_samples {
        let types = column_strings(&dataset.sample_metadata, "sampleMetadata", sample::SAMPLE_TYPE)?;
        let roles = column_strings(&dataset.sample_metadata, "sampleMetadata", sample::ASSAY_ROLE)?;
        let mask: Vec<bool> = types
            .iter()
            .zip(&roles)
            .map(|(sample_type, role)| {
                let type_ok = sample_type
                    .parse::<SampleType>()
                    .map(|t| filter.sample_types.contains(&t))
                    .unwrap_or(false);
                let role_ok = role
                    .parse::<AssayRole>()
                    .map(|r| filter.assay_roles.contains(&r))
                    .unwrap_or(false);
                type_ok && role_ok
            })
            .collect();
        Some(mask)
    } else {
        None
    };

    if let Some(mask) = new_feature_mask {
        for (current, allowed) in dataset.feature_mask.iter_mut().zip(mask) {
            *current &= allowed;
        }
    }
    if let Some(mask) = new_sample_mask {
        for (current, allowed) in dataset.sample_mask.iter_mut().zip(mask) {
            *current &= allowed;
        }
    }

    debug!(
        samples_included = dataset.sample_mask.iter().filter(|&&m| m).count(),
        features_included = dataset.feature_mask.iter().filter(|&&m| m).count(),
        "masks updated"
    );
    dataset.push_log(format!(
        "Masks updated with filterSamples={}, filterFeatures={}, sampleTypes={:?}, assayRoles={:?}, quantificationTypes={:?}",
        filter.filter_samples,
        filter.filter_features,
        filter.sample_types,
        filter.assay_roles,
        filter.quantification_types,
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use panel_model::Attributes;
    use polars::df;

    fn qc_dataset() -> Dataset {
        let intensity = array![
            [10.0, 1.0],
            [10.5, 1.0],
            [9.5, 50.0],
            [20.0, 2.0],
            [1.0, 1.0],
        ];
        let samples = df!(
            "Sample File Name" => &["p1", "p2", "p3", "s1", "blank1"],
            "AssayRole" => &[
                "Precision Reference",
                "Precision Reference",
                "Precision Reference",
                "Assay",
                "Blank",
            ],
            "SampleType" => &[
                "Study Pool",
                "Study Pool",
                "Study Pool",
                "Study Sample",
                "Procedural Blank",
            ],
        )
        .unwrap();
        let features = df!(
            "Feature Name" => &["alanine", "noise"],
            "quantificationType" => &[
                "Quantified with IS",
                "Monitored for relative information",
            ],
        )
        .unwrap();
        Dataset::new("masks", intensity, samples, features, None, Attributes::default()).unwrap()
    }

    #[test]
    fn blanks_are_filtered_out_by_default() {
        let mut dataset = qc_dataset();
        update_masks(&mut dataset, &MaskFilter::default()).unwrap();
        assert_eq!(dataset.sample_mask, vec![true, true, true, true, false]);
        assert_eq!(dataset.feature_mask, vec![true, true]);
    }

    #[test]
    fn quantification_type_filter_narrows_features() {
        let mut dataset = qc_dataset();
        let filter = MaskFilter {
            quantification_types: vec![QuantificationType::IsQuantified],
            ..MaskFilter::default()
        };
        update_masks(&mut dataset, &filter).unwrap();
        assert_eq!(dataset.feature_mask, vec![true, false]);
    }

    #[test]
    fn masks_never_widen() {
        let mut dataset = qc_dataset();
        let narrow = MaskFilter {
            quantification_types: vec![QuantificationType::IsQuantified],
            ..MaskFilter::default()
        };
        update_masks(&mut dataset, &narrow).unwrap();
        assert_eq!(dataset.feature_mask, vec![true, false]);

        // A later permissive call must not re-include the feature.
        update_masks(&mut dataset, &MaskFilter::default()).unwrap();
        assert_eq!(dataset.feature_mask, vec![true, false]);

        dataset.reset_masks();
        assert_eq!(dataset.feature_mask, vec![true, true]);
    }

    #[test]
    fn rsd_threshold_excludes_imprecise_features() {
        let mut dataset = qc_dataset();
        let filter = MaskFilter {
            rsd_threshold: Some(20.0),
            ..MaskFilter::default()
        };
        update_masks(&mut dataset, &filter).unwrap();
        // alanine pool RSD ~5 %, noise pool RSD far above 20 %.
        assert_eq!(dataset.feature_mask, vec![true, false]);
    }

    #[test]
    fn empty_criteria_are_rejected_before_mutation() {
        let mut dataset = qc_dataset();
        let before = dataset.sample_mask.clone();
        let filter = MaskFilter {
            sample_types: Vec::new(),
            ..MaskFilter::default()
        };
        let err = update_masks(&mut dataset, &filter).unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
        assert_eq!(dataset.sample_mask, before);
    }

    #[test]
    fn failing_rsd_lookup_mutates_nothing() {
        let mut dataset = qc_dataset();
        dataset.sample_metadata = dataset.sample_metadata.drop("AssayRole").unwrap();
        let before_features = dataset.feature_mask.clone();
        let before_samples = dataset.sample_mask.clone();
        let filter = MaskFilter {
            rsd_threshold: Some(20.0),
            ..MaskFilter::default()
        };
        assert!(update_masks(&mut dataset, &filter).is_err());
        assert_eq!(dataset.feature_mask, before_features);
        assert_eq!(dataset.sample_mask, before_samples);
    }
}
