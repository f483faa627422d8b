//! CSV importer over the exporter's three-file layout.
//!
//! Reads `<prefix>_sampleMetadata.csv`, `<prefix>_featureMetadata.csv` and
//! `<prefix>_intensityData.csv`. Censoring tokens in the intensity file map
//! back onto the sentinels, so a censor decision survives the round trip.
//! Metadata columns are typed by inference: all-integer, then all-float,
//! otherwise string, with empty cells as nulls.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use polars::prelude::{Column, DataFrame, DataType, IntoColumn, Series};
use tracing::warn;

use panel_model::columns::feature;
use panel_model::frame::{column_f64s, column_strings, duplicate_names};
use panel_model::values::{parse_f64, parse_i64};
use panel_model::{ABOVE_LOQ, ABOVE_LOQ_TOKEN, BELOW_LOQ, BELOW_LOQ_TOKEN};

use crate::error::{IngestError, Result};
use crate::importer::{ImportBundle, Importer};

/// Importer for the flat-file dataset layout.
#[derive(Debug, Clone)]
pub struct CsvImporter {
    /// Path prefix shared by the three files.
    prefix: PathBuf,
    /// Restrict the import to features measured in this unit.
    unit: Option<String>,
}

impl CsvImporter {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            unit: None,
        }
    }

    /// Keep only features whose `Unit` matches; the disambiguation handle
    /// for panels that report one compound in several units.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    fn table_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .prefix
            .file_name()
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str(suffix);
        self.prefix.with_file_name(name)
    }
}

impl Importer for CsvImporter {
    fn import(&self) -> Result<ImportBundle> {
        let sample_metadata = read_metadata_table(&self.table_path("_sampleMetadata.csv"))?;
        let mut feature_metadata = read_metadata_table(&self.table_path("_featureMetadata.csv"))?;
        let mut intensity = read_intensity_matrix(
            &self.table_path("_intensityData.csv"),
            sample_metadata.height(),
            feature_metadata.height(),
        )?;

        if let Some(unit) = &self.unit {
            (feature_metadata, intensity) =
                filter_by_unit(feature_metadata, intensity, unit)?;
        }
        (feature_metadata, intensity) = keep_first_duplicates(feature_metadata, intensity)?;

        let lod = broadcast_lod(&feature_metadata, sample_metadata.height())?;
        let bundle = ImportBundle {
            intensity,
            sample_metadata,
            feature_metadata,
            lod,
        };
        bundle.check_shapes()?;
        Ok(bundle)
    }
}

fn read_metadata_table(path: &Path) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| IngestError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        for (idx, value) in record.iter().enumerate() {
            if idx < cells.len() {
                cells[idx].push(value.trim().to_string());
            }
        }
    }

    let columns: Vec<Column> = headers
        .iter()
        .zip(&cells)
        .map(|(name, values)| infer_column(name, values))
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Type a raw string column: all-integer, then all-float, otherwise string.
/// Empty cells become nulls.
fn infer_column(name: &str, values: &[String]) -> Column {
    let non_empty: Vec<&String> = values.iter().filter(|v| !v.is_empty()).collect();
    if non_empty.is_empty() {
        return Column::full_null(name.into(), values.len(), &DataType::String);
    }

    if non_empty.iter().all(|v| parse_i64(v).is_some()) {
        let ints: Vec<Option<i64>> = values.iter().map(|v| parse_i64(v)).collect();
        return Series::new(name.into(), ints).into_column();
    }
    if non_empty.iter().all(|v| parse_f64(v).is_some()) {
        let floats: Vec<Option<f64>> = values.iter().map(|v| parse_f64(v)).collect();
        return Series::new(name.into(), floats).into_column();
    }
    let strings: Vec<Option<String>> = values
        .iter()
        .map(|v| if v.is_empty() { None } else { Some(v.clone()) })
        .collect();
    Series::new(name.into(), strings).into_column()
}

fn read_intensity_matrix(path: &Path, rows: usize, cols: usize) -> Result<Array2<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| IngestError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut data = Vec::with_capacity(rows * cols);
    let mut row_count = 0usize;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| IngestError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        if record.len() != cols {
            return Err(IngestError::Shape(format!(
                "intensity row {row_idx} has {} column(s), featureMetadata has {cols}",
                record.len()
            )));
        }
        for (col_idx, value) in record.iter().enumerate() {
            data.push(parse_intensity(value).ok_or_else(|| IngestError::InvalidValue {
                path: path.to_path_buf(),
                row: row_idx,
                column: col_idx,
                value: value.to_string(),
            })?);
        }
        row_count += 1;
    }
    if row_count != rows {
        return Err(IngestError::Shape(format!(
            "intensity file has {row_count} row(s), sampleMetadata has {rows}"
        )));
    }

    Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| IngestError::Shape(format!("intensity matrix: {e}")))
}

/// Numeric value, censoring token, or empty-for-missing.
fn parse_intensity(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return Some(f64::NAN);
    }
    match value {
        BELOW_LOQ_TOKEN => Some(BELOW_LOQ),
        ABOVE_LOQ_TOKEN => Some(ABOVE_LOQ),
        _ => parse_f64(value),
    }
}

fn filter_by_unit(
    feature_metadata: DataFrame,
    intensity: Array2<f64>,
    unit: &str,
) -> Result<(DataFrame, Array2<f64>)> {
    let units = column_strings(&feature_metadata, "featureMetadata", feature::UNIT)?;
    if !units.iter().any(|u| u == unit) {
        let mut available: Vec<&String> = units.iter().collect();
        available.sort();
        available.dedup();
        return Err(IngestError::Shape(format!(
            "unit '{unit}' is not present in the input data, available units: {}",
            available
                .iter()
                .map(|u| u.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    let keep: Vec<bool> = units.iter().map(|u| u == unit).collect();
    select_features(feature_metadata, intensity, &keep)
}

/// Only the first occurrence of a duplicated feature name is kept; the
/// rest are dropped with a warning listing them.
fn keep_first_duplicates(
    feature_metadata: DataFrame,
    intensity: Array2<f64>,
) -> Result<(DataFrame, Array2<f64>)> {
    let names = column_strings(&feature_metadata, "featureMetadata", feature::NAME)?;
    let dupes = duplicate_names(&names);
    if dupes.is_empty() {
        return Ok((feature_metadata, intensity));
    }

    let units = column_strings(&feature_metadata, "featureMetadata", feature::UNIT)
        .unwrap_or_else(|_| vec![String::new(); names.len()]);
    let mut available: Vec<&String> = units.iter().collect();
    available.sort();
    available.dedup();
    warn!(
        "features present more than once, keeping the first occurrence: {}; available units: {}",
        dupes.join(", "),
        available
            .iter()
            .map(|u| u.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut seen = std::collections::HashSet::new();
    let keep: Vec<bool> = names.iter().map(|name| seen.insert(name.clone())).collect();
    select_features(feature_metadata, intensity, &keep)
}

fn select_features(
    feature_metadata: DataFrame,
    intensity: Array2<f64>,
    keep: &[bool],
) -> Result<(DataFrame, Array2<f64>)> {
    let kept_indices: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter(|(_, &k)| k)
        .map(|(i, _)| i)
        .collect();
    let filtered = feature_metadata
        .filter(&panel_model::frame::mask_chunked(keep))
        .map_err(panel_model::PanelError::from)?;
    let intensity = intensity.select(ndarray::Axis(1), &kept_indices);
    Ok((filtered, intensity))
}

/// Broadcast the per-feature LOD column into a per-(sample, feature) matrix.
fn broadcast_lod(feature_metadata: &DataFrame, n_samples: usize) -> Result<Option<Array2<f64>>> {
    let Ok(lods) = column_f64s(feature_metadata, "featureMetadata", feature::LOD) else {
        return Ok(None);
    };
    let row: Vec<f64> = lods
        .into_iter()
        .map(|v| v.unwrap_or(f64::NEG_INFINITY))
        .collect();
    let matrix = Array2::from_shape_fn((n_samples, row.len()), |(_, j)| row[j]);
    Ok(Some(matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_layout(dir: &TempDir) -> PathBuf {
        let prefix = dir.path().join("run1");
        std::fs::write(
            dir.path().join("run1_sampleMetadata.csv"),
            "Sample File Name,Dilution,Run Order\n\
             s1.raw,100,1\n\
             s2.raw,100,2\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("run1_featureMetadata.csv"),
            "Feature Name,Unit,LOD\n\
             alanine,µM,10\n\
             glycine,µM,5\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("run1_intensityData.csv"),
            "<LLOQ,12.5\n42.0,>ULOQ\n",
        )
        .unwrap();
        prefix
    }

    #[test]
    fn round_trips_censoring_tokens() {
        let dir = TempDir::new().unwrap();
        let prefix = write_layout(&dir);
        let bundle = CsvImporter::new(prefix).import().unwrap();

        assert_eq!(bundle.intensity[[0, 0]], BELOW_LOQ);
        assert_eq!(bundle.intensity[[0, 1]], 12.5);
        assert_eq!(bundle.intensity[[1, 0]], 42.0);
        assert_eq!(bundle.intensity[[1, 1]], ABOVE_LOQ);
    }

    #[test]
    fn infers_column_types() {
        let dir = TempDir::new().unwrap();
        let prefix = write_layout(&dir);
        let bundle = CsvImporter::new(prefix).import().unwrap();

        let run_order = bundle.sample_metadata.column("Run Order").unwrap();
        assert_eq!(run_order.dtype(), &DataType::Int64);
        let name = bundle.sample_metadata.column("Sample File Name").unwrap();
        assert_eq!(name.dtype(), &DataType::String);
    }

    #[test]
    fn broadcasts_lod_across_samples() {
        let dir = TempDir::new().unwrap();
        let prefix = write_layout(&dir);
        let bundle = CsvImporter::new(prefix).import().unwrap();

        let lod = bundle.lod.unwrap();
        assert_eq!(lod.dim(), (2, 2));
        assert_eq!(lod[[0, 0]], 10.0);
        assert_eq!(lod[[1, 1]], 5.0);
    }

    #[test]
    fn duplicate_features_keep_first() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("dup_sampleMetadata.csv"),
            "Sample File Name\ns1.raw\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("dup_featureMetadata.csv"),
            "Feature Name,Unit\nalanine,µM\nalanine,mmol/mol\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("dup_intensityData.csv"), "1.0,2.0\n").unwrap();

        let bundle = CsvImporter::new(dir.path().join("dup")).import().unwrap();
        assert_eq!(bundle.feature_metadata.height(), 1);
        assert_eq!(bundle.intensity[[0, 0]], 1.0);
    }

    #[test]
    fn unit_filter_selects_matching_features() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("u_sampleMetadata.csv"),
            "Sample File Name\ns1.raw\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("u_featureMetadata.csv"),
            "Feature Name,Unit\nalanine,µM\nalanine,mmol/mol\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("u_intensityData.csv"), "1.0,2.0\n").unwrap();

        let bundle = CsvImporter::new(dir.path().join("u"))
            .with_unit("mmol/mol")
            .import()
            .unwrap();
        assert_eq!(bundle.feature_metadata.height(), 1);
        assert_eq!(bundle.intensity[[0, 0]], 2.0);

        let err = CsvImporter::new(dir.path().join("u"))
            .with_unit("ng/mL")
            .import()
            .unwrap_err();
        assert!(err.to_string().contains("available units"));
    }

    #[test]
    fn row_count_disagreement_is_a_shape_error() {
        let dir = TempDir::new().unwrap();
        let prefix = write_layout(&dir);
        std::fs::write(dir.path().join("run1_intensityData.csv"), "1.0,2.0\n").unwrap();
        let err = CsvImporter::new(prefix).import().unwrap_err();
        assert!(matches!(err, IngestError::Shape(_)));
    }
}
