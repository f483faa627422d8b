//! The dataset aggregate: measurement matrix, metadata tables, masks,
//! calibration and exclusion history.
//!
//! Row `i` of `sample_metadata` describes row `i` of `intensity`, and row `j`
//! of `feature_metadata` describes column `j` — that correspondence is the
//! central invariant every public operation must preserve.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ndarray::{Array2, Axis};
use polars::prelude::DataFrame;

use crate::attributes::Attributes;
use crate::columns;
use crate::enums::VariableType;
use crate::error::{PanelError, Result};
use crate::frame::{column_strings, duplicate_names, mask_chunked};

/// Sentinel for a value below the limit of quantification.
pub const BELOW_LOQ: f64 = f64::NEG_INFINITY;
/// Sentinel for a value above the limit of quantification.
pub const ABOVE_LOQ: f64 = f64::INFINITY;
/// Token written to exports in place of [`BELOW_LOQ`].
pub const BELOW_LOQ_TOKEN: &str = "<LLOQ";
/// Token written to exports in place of [`ABOVE_LOQ`].
pub const ABOVE_LOQ_TOKEN: &str = ">ULOQ";

/// One timestamped provenance entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Snapshot of data removed by one destructive operation.
///
/// A record drops rows on one axis only: a sample-drop record carries the
/// removed sample rows and their full-width intensity block with an empty
/// feature table, and vice versa for a feature-drop record.
#[derive(Debug, Clone)]
pub struct ExclusionRecord {
    pub samples: DataFrame,
    pub features: DataFrame,
    pub intensity: Array2<f64>,
    pub reason: String,
}

/// Calibration-standard runs accompanying a dataset.
///
/// Structurally a dataset in miniature; excluded from QC filtering and from
/// censoring, but its feature axis must stay consistent with the main tables.
#[derive(Debug, Clone)]
pub struct Calibration {
    pub intensity: Array2<f64>,
    pub sample_metadata: DataFrame,
    pub feature_metadata: DataFrame,
    pub expected_concentration: Option<DataFrame>,
}

impl Calibration {
    /// An empty calibration consistent with the given main tables.
    pub fn empty_for(sample_metadata: &DataFrame, feature_metadata: &DataFrame) -> Self {
        Self {
            intensity: Array2::zeros((0, feature_metadata.height())),
            sample_metadata: sample_metadata.clear(),
            feature_metadata: feature_metadata.clone(),
            expected_concentration: None,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.intensity.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }
}

/// A quantified targeted-panel dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Human label, usually derived from the import source.
    pub name: String,
    /// Source file names, accumulated across merges.
    pub file_names: Vec<String>,
    /// Source file paths, accumulated across merges.
    pub file_paths: Vec<PathBuf>,
    /// Kind of variable axis; targeted panels are discrete.
    pub variable_type: VariableType,
    /// Method-level configuration.
    pub attributes: Attributes,
    /// Measurement matrix, samples x features. Missing is NaN; censored
    /// values hold [`BELOW_LOQ`] / [`ABOVE_LOQ`].
    pub intensity: Array2<f64>,
    /// One row per sample, aligned with the matrix rows.
    pub sample_metadata: DataFrame,
    /// One row per feature, aligned with the matrix columns.
    pub feature_metadata: DataFrame,
    /// Inclusion flags per sample; filtering only ever narrows these.
    pub sample_mask: Vec<bool>,
    /// Inclusion flags per feature.
    pub feature_mask: Vec<bool>,
    /// Per-(sample, feature) detection limits supplied by the importer.
    pub lod: Option<Array2<f64>>,
    pub calibration: Calibration,
    /// Append-only audit of destructive operations.
    pub exclusions: Vec<ExclusionRecord>,
    /// Out-of-schema values carried through merges as `[self, other]` pairs.
    pub extensions: BTreeMap<String, serde_json::Value>,
    /// Append-only provenance log.
    pub log: Vec<LogEntry>,
}

impl Dataset {
    /// Assemble a dataset from importer output, checking shape agreement and
    /// feature-name uniqueness before anything else sees it.
    pub fn new(
        name: impl Into<String>,
        intensity: Array2<f64>,
        sample_metadata: DataFrame,
        feature_metadata: DataFrame,
        lod: Option<Array2<f64>>,
        attributes: Attributes,
    ) -> Result<Self> {
        if sample_metadata.height() != intensity.nrows() {
            return Err(PanelError::ShapeMismatch {
                table: "sampleMetadata".to_string(),
                expected: intensity.nrows(),
                actual: sample_metadata.height(),
            });
        }
        if feature_metadata.height() != intensity.ncols() {
            return Err(PanelError::ShapeMismatch {
                table: "featureMetadata".to_string(),
                expected: intensity.ncols(),
                actual: feature_metadata.height(),
            });
        }
        if let Some(lod) = &lod
            && lod.dim() != intensity.dim()
        {
            return Err(PanelError::Config(format!(
                "LOD matrix is {:?}, intensity is {:?}",
                lod.dim(),
                intensity.dim()
            )));
        }

        let name = name.into();
        let calibration = Calibration::empty_for(&sample_metadata, &feature_metadata);
        let mut dataset = Self {
            name: name.clone(),
            file_names: vec![name],
            file_paths: Vec::new(),
            variable_type: VariableType::Discrete,
            attributes,
            sample_mask: vec![true; intensity.nrows()],
            feature_mask: vec![true; intensity.ncols()],
            intensity,
            sample_metadata,
            feature_metadata,
            lod,
            calibration,
            exclusions: Vec::new(),
            extensions: BTreeMap::new(),
            log: Vec::new(),
        };
        dataset.check_unique_feature_names()?;
        dataset.push_log(format!(
            "Dataset initialised with {} samples, {} features",
            dataset.n_samples(),
            dataset.n_features()
        ));
        Ok(dataset)
    }

    pub fn n_samples(&self) -> usize {
        self.intensity.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.intensity.ncols()
    }

    /// Shape agreement between the matrix, both metadata tables and both
    /// masks, plus feature-name uniqueness when the name column is present.
    pub fn check_shape_invariants(&self) -> Result<()> {
        if self.sample_metadata.height() != self.n_samples() {
            return Err(PanelError::ShapeMismatch {
                table: "sampleMetadata".to_string(),
                expected: self.n_samples(),
                actual: self.sample_metadata.height(),
            });
        }
        if self.feature_metadata.height() != self.n_features() {
            return Err(PanelError::ShapeMismatch {
                table: "featureMetadata".to_string(),
                expected: self.n_features(),
                actual: self.feature_metadata.height(),
            });
        }
        if self.sample_mask.len() != self.n_samples() {
            return Err(PanelError::ShapeMismatch {
                table: "sampleMask".to_string(),
                expected: self.n_samples(),
                actual: self.sample_mask.len(),
            });
        }
        if self.feature_mask.len() != self.n_features() {
            return Err(PanelError::ShapeMismatch {
                table: "featureMask".to_string(),
                expected: self.n_features(),
                actual: self.feature_mask.len(),
            });
        }
        self.check_unique_feature_names()
    }

    fn check_unique_feature_names(&self) -> Result<()> {
        if self.feature_metadata.column(columns::feature::NAME).is_err() {
            // Uniqueness is checked once the column exists; its presence is a
            // Basic-level validation concern, not a construction one.
            return Ok(());
        }
        let names = self.feature_names()?;
        let dupes = duplicate_names(&names);
        if dupes.is_empty() {
            Ok(())
        } else {
            Err(PanelError::DuplicateFeatureNames { names: dupes })
        }
    }

    /// Feature names in matrix-column order.
    pub fn feature_names(&self) -> Result<Vec<String>> {
        column_strings(&self.feature_metadata, "featureMetadata", columns::feature::NAME)
    }

    /// Sample file names in matrix-row order.
    pub fn sample_file_names(&self) -> Result<Vec<String>> {
        column_strings(&self.sample_metadata, "sampleMetadata", columns::sample::FILE_NAME)
    }

    /// Restore both masks to all-included. The only widening operation.
    pub fn reset_masks(&mut self) {
        self.sample_mask = vec![true; self.n_samples()];
        self.feature_mask = vec![true; self.n_features()];
        self.push_log("Masks reset to all-included".to_string());
    }

    /// Destructively drop everything the masks exclude, snapshotting the
    /// removed rows and columns into the exclusion history, then reset the
    /// masks. Calibration feature tables are trimmed to match. No record is
    /// appended for an axis with nothing excluded.
    pub fn apply_masks(&mut self, reason: &str) -> Result<()> {
        self.check_shape_invariants()?;

        let dropped_samples: Vec<usize> = mask_indices(&self.sample_mask, false);
        let dropped_features: Vec<usize> = mask_indices(&self.feature_mask, false);
        if dropped_samples.is_empty() && dropped_features.is_empty() {
            return Ok(());
        }

        if !dropped_samples.is_empty() {
            let excluded: Vec<bool> = self.sample_mask.iter().map(|kept| !kept).collect();
            let removed = self.sample_metadata.filter(&mask_chunked(&excluded))?;
            self.exclusions.push(ExclusionRecord {
                samples: removed,
                features: self.feature_metadata.clear(),
                intensity: self.intensity.select(Axis(0), &dropped_samples),
                reason: format!("{reason} (samples)"),
            });
        }
        if !dropped_features.is_empty() {
            let excluded: Vec<bool> = self.feature_mask.iter().map(|kept| !kept).collect();
            let removed = self.feature_metadata.filter(&mask_chunked(&excluded))?;
            self.exclusions.push(ExclusionRecord {
                samples: self.sample_metadata.clear(),
                features: removed,
                intensity: self.intensity.select(Axis(1), &dropped_features),
                reason: format!("{reason} (features)"),
            });
        }

        let kept_samples = mask_indices(&self.sample_mask, true);
        let kept_features = mask_indices(&self.feature_mask, true);

        self.sample_metadata = self.sample_metadata.filter(&mask_chunked(&self.sample_mask))?;
        self.feature_metadata = self
            .feature_metadata
            .filter(&mask_chunked(&self.feature_mask))?;
        self.intensity = self
            .intensity
            .select(Axis(0), &kept_samples)
            .select(Axis(1), &kept_features);
        if let Some(lod) = self.lod.take() {
            self.lod = Some(lod.select(Axis(0), &kept_samples).select(Axis(1), &kept_features));
        }

        // The calibration feature axis follows the main tables; calibration
        // samples are outside QC filtering and stay put.
        self.calibration.feature_metadata = self
            .calibration
            .feature_metadata
            .filter(&mask_chunked(&self.feature_mask))?;
        self.calibration.intensity = self.calibration.intensity.select(Axis(1), &kept_features);

        self.sample_mask = vec![true; kept_samples.len()];
        self.feature_mask = vec![true; kept_features.len()];

        self.push_log(format!(
            "Masks applied ({reason}): removed {} samples, {} features; {} samples and {} features remain",
            dropped_samples.len(),
            dropped_features.len(),
            self.n_samples(),
            self.n_features(),
        ));
        self.check_shape_invariants()
    }

    pub fn push_log(&mut self, message: impl Into<String>) {
        self.log.push(LogEntry {
            at: Utc::now(),
            message: message.into(),
        });
    }
}

/// Indices where the mask holds `value`.
fn mask_indices(mask: &[bool], value: bool) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, &m)| m == value)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use polars::df;

    fn small_dataset() -> Dataset {
        let intensity = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let samples = df!(
            "Sample File Name" => &["s1", "s2"],
        )
        .unwrap();
        let features = df!(
            "Feature Name" => &["alanine", "glycine", "serine"],
            "Unit" => &["µM", "µM", "µM"],
        )
        .unwrap();
        Dataset::new("test", intensity, samples, features, None, Attributes::default()).unwrap()
    }

    #[test]
    fn new_rejects_shape_disagreement() {
        let intensity = array![[1.0, 2.0], [3.0, 4.0]];
        let samples = df!("Sample File Name" => &["s1"]).unwrap();
        let features = df!("Feature Name" => &["a", "b"]).unwrap();
        let err =
            Dataset::new("bad", intensity, samples, features, None, Attributes::default())
                .unwrap_err();
        assert!(matches!(err, PanelError::ShapeMismatch { .. }));
    }

    #[test]
    fn new_rejects_duplicate_feature_names() {
        let intensity = array![[1.0, 2.0]];
        let samples = df!("Sample File Name" => &["s1"]).unwrap();
        let features = df!("Feature Name" => &["alanine", "alanine"]).unwrap();
        let err =
            Dataset::new("bad", intensity, samples, features, None, Attributes::default())
                .unwrap_err();
        match err {
            PanelError::DuplicateFeatureNames { names } => {
                assert_eq!(names, vec!["alanine".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn apply_masks_drops_and_records() {
        let mut dataset = small_dataset();
        dataset.feature_mask[1] = false;
        dataset.apply_masks("unit filter").unwrap();

        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.feature_names().unwrap(), vec!["alanine", "serine"]);
        assert_eq!(dataset.intensity, array![[1.0, 3.0], [4.0, 6.0]]);
        assert_eq!(dataset.feature_mask, vec![true, true]);
        assert_eq!(dataset.exclusions.len(), 1);

        let record = &dataset.exclusions[0];
        assert_eq!(record.features.height(), 1);
        assert_eq!(record.samples.height(), 0);
        assert_eq!(record.intensity, array![[2.0], [5.0]]);
        assert!(record.reason.contains("unit filter"));
    }

    #[test]
    fn apply_masks_without_exclusions_is_a_noop() {
        let mut dataset = small_dataset();
        dataset.apply_masks("nothing").unwrap();
        assert!(dataset.exclusions.is_empty());
        assert_eq!(dataset.n_samples(), 2);
    }

    #[test]
    fn calibration_feature_axis_follows_apply_masks() {
        let mut dataset = small_dataset();
        dataset.feature_mask[0] = false;
        dataset.apply_masks("trim").unwrap();
        assert_eq!(dataset.calibration.feature_metadata.height(), 2);
        assert_eq!(dataset.calibration.intensity.ncols(), 2);
    }
}
