//! CSV export.
//!
//! Writes the three-file layout (`<prefix>_intensityData.csv`,
//! `<prefix>_sampleMetadata.csv`, `<prefix>_featureMetadata.csv`) and a
//! combined single-file form. Censoring sentinels always render as the
//! `<LLOQ` / `>ULOQ` tokens; missing values render as empty cells.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use polars::prelude::{AnyValue, DataFrame, DataType, IntoColumn, Series};
use tracing::debug;

use panel_model::columns::sample;
use panel_model::frame::{column_f64s, column_names};
use panel_model::values::any_to_string;
use panel_model::{ABOVE_LOQ_TOKEN, BELOW_LOQ_TOKEN, Dataset};

use crate::error::{ExportError, Result};

/// Switches for an export.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Replace commas inside metadata text with semicolons, for downstream
    /// tools that cannot handle quoted delimiters.
    pub escape_delimiters: bool,
    /// Apply the masks to a working copy before writing, so excluded rows
    /// and columns stay out of the files.
    pub with_exclusions: bool,
    /// Rescale intensity by 100 / `Dilution` per sample before writing.
    pub apply_dilution: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            escape_delimiters: false,
            with_exclusions: true,
            apply_dilution: false,
        }
    }
}

/// Export the dataset as the three-file layout under `prefix`.
///
/// The intensity file carries no header or index; its row count matches the
/// sample-metadata export and its column count the feature-metadata export.
pub fn export_dataset(dataset: &Dataset, prefix: &Path, options: &ExportOptions) -> Result<()> {
    let (sample_metadata, feature_metadata, intensity) = prepared_tables(dataset, options)?;

    write_frame(&suffixed(prefix, "_sampleMetadata.csv"), &sample_metadata)?;
    write_frame(&suffixed(prefix, "_featureMetadata.csv"), &feature_metadata)?;
    write_intensity(&suffixed(prefix, "_intensityData.csv"), &intensity)?;
    debug!(
        "exported dataset '{}' ({} samples, {} features) to {}",
        dataset.name,
        intensity.nrows(),
        intensity.ncols(),
        prefix.display()
    );
    Ok(())
}

/// Export everything as one combined file: the feature metadata transposed
/// above the intensity block, sample metadata as leading columns, intensity
/// columns keyed by feature row index.
pub fn export_unified_csv(dataset: &Dataset, prefix: &Path, options: &ExportOptions) -> Result<()> {
    let (sample_metadata, feature_metadata, intensity) = prepared_tables(dataset, options)?;
    let path = suffixed(prefix, "_combinedData.csv");
    let mut writer = csv::Writer::from_path(&path).map_err(|e| ExportError::Csv {
        path: path.clone(),
        source: e,
    })?;

    let sample_columns = column_names(&sample_metadata);
    let feature_columns = column_names(&feature_metadata);
    let n_features = feature_metadata.height();

    // Header: index label, sample-metadata columns, feature indices.
    let mut header = vec![String::new()];
    header.extend(sample_columns.iter().cloned());
    header.extend((0..n_features).map(|j| j.to_string()));
    write_row(&mut writer, &path, &header)?;

    // Transposed feature-metadata block.
    for column in &feature_columns {
        let mut row = vec![column.clone()];
        row.extend(std::iter::repeat_n(String::new(), sample_columns.len()));
        let values = feature_metadata.column(column).map_err(panel_model::PanelError::from)?;
        for j in 0..n_features {
            row.push(any_to_string(values.get(j).unwrap_or(AnyValue::Null)));
        }
        write_row(&mut writer, &path, &row)?;
    }

    // Sample rows: index, metadata, intensity.
    for i in 0..sample_metadata.height() {
        let mut row = vec![i.to_string()];
        for column in &sample_columns {
            let values = sample_metadata.column(column).map_err(panel_model::PanelError::from)?;
            row.push(any_to_string(values.get(i).unwrap_or(AnyValue::Null)));
        }
        for j in 0..intensity.ncols() {
            row.push(render_intensity(intensity[[i, j]]));
        }
        write_row(&mut writer, &path, &row)?;
    }

    writer.flush().map_err(ExportError::Io)?;
    Ok(())
}

/// Working copies of the tables with exclusions, dilution scaling, export
/// filtering and delimiter escaping applied.
fn prepared_tables(
    dataset: &Dataset,
    options: &ExportOptions,
) -> Result<(DataFrame, DataFrame, Array2<f64>)> {
    let mut working = dataset.clone();
    if options.with_exclusions {
        working.apply_masks("excluded on export")?;
    }

    if options.apply_dilution {
        // Values are reported at 100 % dilution; rescale per sample.
        if let Ok(dilutions) =
            column_f64s(&working.sample_metadata, "sampleMetadata", sample::DILUTION)
        {
            for (i, dilution) in dilutions.iter().enumerate() {
                let Some(dilution) = dilution else { continue };
                if *dilution > 0.0 {
                    let factor = 100.0 / dilution;
                    for j in 0..working.intensity.ncols() {
                        working.intensity[[i, j]] *= factor;
                    }
                }
            }
        }
    }

    let mut sample_metadata = drop_columns(
        &working.sample_metadata,
        &working.attributes.sample_metadata_not_exported,
    );
    let mut feature_metadata = drop_columns(
        &working.feature_metadata,
        &working.attributes.feature_metadata_not_exported,
    );
    if options.escape_delimiters {
        sample_metadata = escape_delimiters(&sample_metadata)?;
        feature_metadata = escape_delimiters(&feature_metadata)?;
    }
    Ok((sample_metadata, feature_metadata, working.intensity))
}

fn drop_columns(df: &DataFrame, excluded: &[String]) -> DataFrame {
    let mut out = df.clone();
    for column in excluded {
        if let Ok(dropped) = out.drop(column) {
            out = dropped;
        }
    }
    out
}

/// Replace commas in string columns with semicolons.
fn escape_delimiters(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    for name in column_names(df) {
        let column = df.column(&name).map_err(panel_model::PanelError::from)?;
        if column.dtype() != &DataType::String {
            continue;
        }
        let escaped: Vec<Option<String>> = (0..df.height())
            .map(|i| match column.get(i).unwrap_or(AnyValue::Null) {
                AnyValue::Null => None,
                value => Some(any_to_string(value).replace(',', ";")),
            })
            .collect();
        out.with_column(Series::new(name.as_str().into(), escaped).into_column())
            .map_err(panel_model::PanelError::from)?;
    }
    Ok(out)
}

fn write_frame(path: &Path, df: &DataFrame) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ExportError::Csv {
        path: path.to_path_buf(),
        source: e,
    })?;
    let columns = column_names(df);
    write_row(&mut writer, path, &columns)?;
    for i in 0..df.height() {
        let mut row = Vec::with_capacity(columns.len());
        for column in &columns {
            let values = df.column(column).map_err(panel_model::PanelError::from)?;
            row.push(any_to_string(values.get(i).unwrap_or(AnyValue::Null)));
        }
        write_row(&mut writer, path, &row)?;
    }
    writer.flush().map_err(ExportError::Io)?;
    Ok(())
}

fn write_intensity(path: &Path, intensity: &Array2<f64>) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| ExportError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
    for i in 0..intensity.nrows() {
        let row: Vec<String> = (0..intensity.ncols())
            .map(|j| render_intensity(intensity[[i, j]]))
            .collect();
        write_row(&mut writer, path, &row)?;
    }
    writer.flush().map_err(ExportError::Io)?;
    Ok(())
}

/// Sentinels render as their tokens, missing as an empty cell.
fn render_intensity(value: f64) -> String {
    if value == f64::NEG_INFINITY {
        BELOW_LOQ_TOKEN.to_string()
    } else if value == f64::INFINITY {
        ABOVE_LOQ_TOKEN.to_string()
    } else if value.is_nan() {
        String::new()
    } else {
        format!("{value}")
    }
}

fn write_row<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    path: &Path,
    row: &[String],
) -> Result<()> {
    writer.write_record(row).map_err(|e| ExportError::Csv {
        path: path.to_path_buf(),
        source: e,
    })
}

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix
        .file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(suffix);
    prefix.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_render_as_tokens() {
        assert_eq!(render_intensity(f64::NEG_INFINITY), "<LLOQ");
        assert_eq!(render_intensity(f64::INFINITY), ">ULOQ");
        assert_eq!(render_intensity(f64::NAN), "");
        assert_eq!(render_intensity(12.5), "12.5");
    }

    #[test]
    fn suffixed_extends_the_file_name() {
        let path = suffixed(Path::new("/tmp/out/run1"), "_intensityData.csv");
        assert_eq!(path, Path::new("/tmp/out/run1_intensityData.csv"));
    }
}
