//! Four-level dataset conformance classifier.
//!
//! Levels strictly nest: a dataset is `Basic` only if it is also
//! `Structural`, and so on up to `FullyAnnotated`. Every check always runs
//! and accumulates into its level's failure list; the report's booleans are
//! derived from those lists. Validation inspects, it never mutates.
//!
//! ## Levels
//!
//! 1. **Structural** — matrix, metadata tables and masks exist with
//!    consistent shapes.
//! 2. **Basic** — method attributes present, required feature columns typed
//!    correctly, feature names unique, calibration sub-tables consistent.
//! 3. **QcReady** — sample metadata carries the typed QC columns (sample
//!    type, assay role, dilution, batches, run order, acquisition time).
//! 4. **FullyAnnotated** — QcReady plus subject and sample identifiers.

use polars::prelude::{DataFrame, DataType};
use serde::Serialize;
use tracing::{info, warn};

use panel_model::columns::{feature, sample};
use panel_model::frame::{column_names, column_strings, duplicate_names, require_column};
use panel_model::values::parse_timestamp;
use panel_model::{
    AssayRole, CalibrationMethod, Dataset, PanelError, QuantificationType, Result, SampleType,
};

/// Conformance level of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Level {
    Structural,
    Basic,
    QcReady,
    FullyAnnotated,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Structural => "structural dataset",
            Level::Basic => "basic targeted dataset",
            Level::QcReady => "QC-ready",
            Level::FullyAnnotated => "fully annotated",
        }
    }
}

/// Behaviour switches for a validation run.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    /// Log every check outcome, passing or failing.
    pub verbose: bool,
    /// Emit a warning per failing check.
    pub raise_warning: bool,
    /// Abort on the first Structural or Basic failure with its typed error.
    pub raise_error: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            raise_warning: true,
            raise_error: false,
        }
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub level: Level,
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Accumulated validation result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckOutcome>,
    pub structural_failures: Vec<String>,
    pub basic_failures: Vec<String>,
    pub qc_failures: Vec<String>,
    pub annotation_failures: Vec<String>,
}

impl ValidationReport {
    pub fn structural(&self) -> bool {
        self.structural_failures.is_empty()
    }

    pub fn basic(&self) -> bool {
        self.structural() && self.basic_failures.is_empty()
    }

    pub fn qc_ready(&self) -> bool {
        self.basic() && self.qc_failures.is_empty()
    }

    pub fn fully_annotated(&self) -> bool {
        self.qc_ready() && self.annotation_failures.is_empty()
    }

    pub fn passes(&self, level: Level) -> bool {
        match level {
            Level::Structural => self.structural(),
            Level::Basic => self.basic(),
            Level::QcReady => self.qc_ready(),
            Level::FullyAnnotated => self.fully_annotated(),
        }
    }

    /// Failure messages for one level only.
    pub fn failures(&self, level: Level) -> &[String] {
        match level {
            Level::Structural => &self.structural_failures,
            Level::Basic => &self.basic_failures,
            Level::QcReady => &self.qc_failures,
            Level::FullyAnnotated => &self.annotation_failures,
        }
    }
}

/// Validate a dataset against all four levels.
///
/// With `raise_error` unset this always returns a report; otherwise the
/// first Structural or Basic failure is returned as its typed error.
pub fn validate(dataset: &Dataset, options: &ValidationOptions) -> Result<ValidationReport> {
    let mut run = Run {
        report: ValidationReport::default(),
        options: *options,
    };

    run.structural_checks(dataset)?;
    // Column-level checks presume agreeing shapes; on structural failure the
    // remaining levels are reported as failed without inspecting further.
    if run.report.structural() {
        run.basic_checks(dataset)?;
        run.qc_checks(dataset);
        run.annotation_checks(dataset);
    } else {
        run.report
            .basic_failures
            .push("not checked: structural validation failed".to_string());
    }

    if options.raise_warning && !run.report.qc_ready() {
        warn!(
            "dataset '{}' lacks parameters for QC ({} failure(s))",
            dataset.name,
            run.report.qc_failures.len().max(1)
        );
    }
    Ok(run.report)
}

struct Run {
    report: ValidationReport,
    options: ValidationOptions,
}

impl Run {
    /// Record one check outcome; propagates the error in raise-error mode
    /// when `fatal` is set (Structural and Basic checks only).
    fn record(
        &mut self,
        level: Level,
        name: &str,
        fatal: bool,
        outcome: Result<()>,
    ) -> Result<()> {
        match outcome {
            Ok(()) => {
                if self.options.verbose {
                    info!("check {name}: OK");
                }
                self.report.checks.push(CheckOutcome {
                    level,
                    name: name.to_string(),
                    passed: true,
                    detail: None,
                });
            }
            Err(err) => {
                let message = err.to_string();
                if self.options.verbose {
                    info!("check {name}: failure, {message}");
                }
                if self.options.raise_warning {
                    warn!("check {name}: {message}");
                }
                if self.options.raise_error && fatal {
                    return Err(err);
                }
                self.report.checks.push(CheckOutcome {
                    level,
                    name: name.to_string(),
                    passed: false,
                    detail: Some(message.clone()),
                });
                match level {
                    Level::Structural => self.report.structural_failures.push(message),
                    Level::Basic => self.report.basic_failures.push(message),
                    Level::QcReady => self.report.qc_failures.push(message),
                    Level::FullyAnnotated => self.report.annotation_failures.push(message),
                }
            }
        }
        Ok(())
    }

    fn structural_checks(&mut self, dataset: &Dataset) -> Result<()> {
        let level = Level::Structural;
        self.record(
            level,
            "sampleMetadata row count",
            true,
            shape_check(
                "sampleMetadata",
                dataset.n_samples(),
                dataset.sample_metadata.height(),
            ),
        )?;
        self.record(
            level,
            "featureMetadata row count",
            true,
            shape_check(
                "featureMetadata",
                dataset.n_features(),
                dataset.feature_metadata.height(),
            ),
        )?;
        self.record(
            level,
            "sampleMask length",
            true,
            shape_check("sampleMask", dataset.n_samples(), dataset.sample_mask.len()),
        )?;
        self.record(
            level,
            "featureMask length",
            true,
            shape_check(
                "featureMask",
                dataset.n_features(),
                dataset.feature_mask.len(),
            ),
        )?;
        if let Some(lod) = &dataset.lod {
            self.record(
                level,
                "LOD matrix shape",
                true,
                if lod.dim() == dataset.intensity.dim() {
                    Ok(())
                } else {
                    Err(PanelError::Config(format!(
                        "LOD matrix is {:?}, intensity is {:?}",
                        lod.dim(),
                        dataset.intensity.dim()
                    )))
                },
            )?;
        }
        Ok(())
    }

    fn basic_checks(&mut self, dataset: &Dataset) -> Result<()> {
        let level = Level::Basic;

        self.record(
            level,
            "attributes.methodName",
            true,
            if dataset.attributes.method_name.trim().is_empty() {
                Err(PanelError::MissingField {
                    field: "attributes.methodName".to_string(),
                })
            } else {
                Ok(())
            },
        )?;
        self.record(
            level,
            "fileName",
            true,
            if dataset.file_names.is_empty() {
                Err(PanelError::MissingField {
                    field: "fileName".to_string(),
                })
            } else {
                Ok(())
            },
        )?;

        for external_id in &dataset.attributes.external_ids {
            self.record(
                level,
                &format!("external ID column '{external_id}'"),
                true,
                require_column(&dataset.feature_metadata, "featureMetadata", external_id)
                    .map(|_| ()),
            )?;
        }

        // Feature Name: present, string typed, unique.
        let name_check = string_column_check(&dataset.feature_metadata, "featureMetadata", feature::NAME);
        let names_usable = name_check.is_ok();
        self.record(level, "featureMetadata['Feature Name']", true, name_check)?;
        if names_usable {
            let names =
                column_strings(&dataset.feature_metadata, "featureMetadata", feature::NAME)?;
            let dupes = duplicate_names(&names);
            self.record(
                level,
                "feature names unique",
                true,
                if dupes.is_empty() {
                    Ok(())
                } else {
                    Err(PanelError::DuplicateFeatureNames { names: dupes })
                },
            )?;
        }

        self.record(
            level,
            "featureMetadata['quantificationType']",
            true,
            enum_column_check::<QuantificationType>(
                &dataset.feature_metadata,
                "featureMetadata",
                feature::QUANTIFICATION_TYPE,
            ),
        )?;
        self.record(
            level,
            "featureMetadata['calibrationMethod']",
            true,
            enum_column_check::<CalibrationMethod>(
                &dataset.feature_metadata,
                "featureMetadata",
                feature::CALIBRATION_METHOD,
            ),
        )?;
        self.record(
            level,
            "featureMetadata['Unit']",
            true,
            string_column_check(&dataset.feature_metadata, "featureMetadata", feature::UNIT),
        )?;

        // Post-merge tables carry LLOQ_batch1 style columns; a contains-match
        // accepts those while still demanding a numeric dtype.
        self.record(
            level,
            "featureMetadata LLOQ column",
            true,
            limit_column_check(&dataset.feature_metadata, feature::LLOQ),
        )?;
        self.record(
            level,
            "featureMetadata ULOQ column",
            true,
            limit_column_check(&dataset.feature_metadata, feature::ULOQ),
        )?;

        self.record(
            level,
            "sampleMetadata['Sample File Name']",
            true,
            string_column_check(&dataset.sample_metadata, "sampleMetadata", sample::FILE_NAME),
        )?;

        self.calibration_checks(dataset)?;
        self.exclusion_checks(dataset)?;
        Ok(())
    }

    fn calibration_checks(&mut self, dataset: &Dataset) -> Result<()> {
        let level = Level::Basic;
        let calibration = &dataset.calibration;

        self.record(
            level,
            "calibration sampleMetadata row count",
            true,
            shape_check(
                "calibration sampleMetadata",
                calibration.intensity.nrows(),
                calibration.sample_metadata.height(),
            ),
        )?;
        self.record(
            level,
            "calibration featureMetadata row count",
            true,
            shape_check(
                "calibration featureMetadata",
                calibration.intensity.ncols(),
                calibration.feature_metadata.height(),
            ),
        )?;
        self.record(
            level,
            "calibration feature axis",
            true,
            shape_check(
                "calibration featureMetadata",
                dataset.n_features(),
                calibration.feature_metadata.height(),
            ),
        )?;
        if let Some(expected) = &calibration.expected_concentration {
            self.record(
                level,
                "calibration expectedConcentration shape",
                true,
                shape_check(
                    "calibration expectedConcentration",
                    calibration.intensity.nrows(),
                    expected.height(),
                )
                .and_then(|()| {
                    if expected.width() == calibration.intensity.ncols() {
                        Ok(())
                    } else {
                        Err(PanelError::ShapeMismatch {
                            table: "calibration expectedConcentration columns".to_string(),
                            expected: calibration.intensity.ncols(),
                            actual: expected.width(),
                        })
                    }
                }),
            )?;
        }
        Ok(())
    }

    fn exclusion_checks(&mut self, dataset: &Dataset) -> Result<()> {
        for (idx, record) in dataset.exclusions.iter().enumerate() {
            let consistent = if record.samples.height() > 0 {
                record.intensity.nrows() == record.samples.height()
            } else if record.features.height() > 0 {
                record.intensity.ncols() == record.features.height()
            } else {
                true
            };
            self.record(
                Level::Basic,
                &format!("exclusion record {idx}"),
                true,
                if consistent {
                    Ok(())
                } else {
                    Err(PanelError::ShapeMismatch {
                        table: format!("exclusion record {idx}"),
                        expected: record.samples.height().max(record.features.height()),
                        actual: record.intensity.nrows().max(record.intensity.ncols()),
                    })
                },
            )?;
        }
        Ok(())
    }

    fn qc_checks(&mut self, dataset: &Dataset) {
        let level = Level::QcReady;
        let table = &dataset.sample_metadata;

        // QC and annotation failures never abort, so the Results below are
        // always Ok and the ? is just plumbing.
        let _ = self.record(
            level,
            "sampleMetadata['SampleType']",
            false,
            enum_column_check::<SampleType>(table, "sampleMetadata", sample::SAMPLE_TYPE),
        );
        let _ = self.record(
            level,
            "sampleMetadata['AssayRole']",
            false,
            enum_column_check::<AssayRole>(table, "sampleMetadata", sample::ASSAY_ROLE),
        );
        let _ = self.record(
            level,
            "sampleMetadata['Dilution']",
            false,
            numeric_column_check(table, "sampleMetadata", sample::DILUTION),
        );
        let _ = self.record(
            level,
            "sampleMetadata['Batch']",
            false,
            numeric_column_check(table, "sampleMetadata", sample::BATCH),
        );
        let _ = self.record(
            level,
            "sampleMetadata['Correction Batch']",
            false,
            numeric_column_check(table, "sampleMetadata", sample::CORRECTION_BATCH),
        );
        let _ = self.record(
            level,
            "sampleMetadata['Run Order']",
            false,
            integer_column_check(table, "sampleMetadata", sample::RUN_ORDER),
        );
        let _ = self.record(
            level,
            "sampleMetadata['Acquired Time']",
            false,
            timestamp_column_check(table, "sampleMetadata", sample::ACQUIRED_TIME),
        );
        let _ = self.record(
            level,
            "sampleMetadata['Sample Base Name']",
            false,
            string_column_check(table, "sampleMetadata", sample::BASE_NAME),
        );
    }

    fn annotation_checks(&mut self, dataset: &Dataset) {
        let level = Level::FullyAnnotated;
        let table = &dataset.sample_metadata;
        let _ = self.record(
            level,
            "sampleMetadata['Subject ID']",
            false,
            string_column_check(table, "sampleMetadata", sample::SUBJECT_ID),
        );
        let _ = self.record(
            level,
            "sampleMetadata['Sample ID']",
            false,
            string_column_check(table, "sampleMetadata", sample::SAMPLE_ID),
        );
    }
}

fn shape_check(table: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(PanelError::ShapeMismatch {
            table: table.to_string(),
            expected,
            actual,
        })
    }
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
            | DataType::Null
    )
}

fn string_column_check(df: &DataFrame, table: &str, column: &str) -> Result<()> {
    let col = require_column(df, table, column)?;
    if matches!(col.dtype(), DataType::String | DataType::Null) {
        Ok(())
    } else {
        Err(PanelError::WrongType {
            table: table.to_string(),
            column: column.to_string(),
            expected: "str".to_string(),
            detail: format!("dtype is {}", col.dtype()),
        })
    }
}

fn numeric_column_check(df: &DataFrame, table: &str, column: &str) -> Result<()> {
    let col = require_column(df, table, column)?;
    if is_numeric_dtype(col.dtype()) || col.dtype() == &DataType::Null {
        Ok(())
    } else {
        Err(PanelError::WrongType {
            table: table.to_string(),
            column: column.to_string(),
            expected: "int or float".to_string(),
            detail: format!("dtype is {}", col.dtype()),
        })
    }
}

fn integer_column_check(df: &DataFrame, table: &str, column: &str) -> Result<()> {
    let col = require_column(df, table, column)?;
    if is_integer_dtype(col.dtype()) {
        Ok(())
    } else {
        Err(PanelError::WrongType {
            table: table.to_string(),
            column: column.to_string(),
            expected: "int".to_string(),
            detail: format!("dtype is {}", col.dtype()),
        })
    }
}

/// Every value of the column must parse into the enum `E`.
fn enum_column_check<E>(df: &DataFrame, table: &str, column: &str) -> Result<()>
where
    E: std::str::FromStr,
{
    let values = column_strings(df, table, column)?;
    let mut invalid: Vec<String> = Vec::new();
    for value in values {
        if value.parse::<E>().is_err() && !invalid.contains(&value) {
            invalid.push(value);
        }
        if invalid.len() >= 5 {
            break;
        }
    }
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(PanelError::WrongType {
            table: table.to_string(),
            column: column.to_string(),
            expected: format!("an enum '{}'", std::any::type_name::<E>().rsplit("::").next().unwrap_or("value")),
            detail: format!("invalid value(s): {}", invalid.join(", ")),
        })
    }
}

/// Every non-empty value of the column must parse as a timestamp.
fn timestamp_column_check(df: &DataFrame, table: &str, column: &str) -> Result<()> {
    let values = column_strings(df, table, column)?;
    let invalid: Vec<String> = values
        .into_iter()
        .filter(|v| !v.trim().is_empty() && parse_timestamp(v).is_none())
        .take(5)
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(PanelError::WrongType {
            table: table.to_string(),
            column: column.to_string(),
            expected: "datetime".to_string(),
            detail: format!("invalid value(s): {}", invalid.join(", ")),
        })
    }
}

/// A column whose name contains `stem` must exist with a numeric dtype.
fn limit_column_check(df: &DataFrame, stem: &str) -> Result<()> {
    let candidates: Vec<String> = column_names(df)
        .into_iter()
        .filter(|name| name.contains(stem))
        .collect();
    let Some(first) = candidates.first() else {
        return Err(PanelError::MissingColumn {
            table: "featureMetadata".to_string(),
            column: stem.to_string(),
        });
    };
    numeric_column_check(df, "featureMetadata", first)
}
