//! The importer seam.
//!
//! Format-specific readers live behind [`Importer`]; the engine only ever
//! sees the four-table bundle, with row and column counts guaranteed to
//! agree.

use ndarray::Array2;
use polars::prelude::DataFrame;

use panel_model::{Attributes, Dataset};

use crate::error::{IngestError, Result};

/// Raw tables produced by a format-specific reader.
#[derive(Debug, Clone)]
pub struct ImportBundle {
    pub intensity: Array2<f64>,
    pub sample_metadata: DataFrame,
    pub feature_metadata: DataFrame,
    /// Per-(sample, feature) detection limits, usually a per-feature limit
    /// broadcast across samples.
    pub lod: Option<Array2<f64>>,
}

impl ImportBundle {
    /// Shape agreement between the matrix and both metadata tables.
    pub fn check_shapes(&self) -> Result<()> {
        if self.sample_metadata.height() != self.intensity.nrows() {
            return Err(IngestError::Shape(format!(
                "sampleMetadata has {} rows, intensity has {} sample row(s)",
                self.sample_metadata.height(),
                self.intensity.nrows()
            )));
        }
        if self.feature_metadata.height() != self.intensity.ncols() {
            return Err(IngestError::Shape(format!(
                "featureMetadata has {} rows, intensity has {} feature column(s)",
                self.feature_metadata.height(),
                self.intensity.ncols()
            )));
        }
        if let Some(lod) = &self.lod
            && lod.dim() != self.intensity.dim()
        {
            return Err(IngestError::Shape(format!(
                "LOD matrix is {:?}, intensity is {:?}",
                lod.dim(),
                self.intensity.dim()
            )));
        }
        Ok(())
    }
}

/// A source of raw measurement tables.
pub trait Importer {
    /// Read the source into a shape-consistent bundle.
    fn import(&self) -> Result<ImportBundle>;

    /// Read the source and assemble a [`Dataset`] around it.
    fn import_dataset(&self, name: &str, attributes: Attributes) -> Result<Dataset> {
        let bundle = self.import()?;
        bundle.check_shapes()?;
        Ok(Dataset::new(
            name,
            bundle.intensity,
            bundle.sample_metadata,
            bundle.feature_metadata,
            bundle.lod,
            attributes,
        )?)
    }
}
