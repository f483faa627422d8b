use thiserror::Error;

/// Error taxonomy for dataset construction, filtering, validation and merge.
///
/// Configuration errors are raised before any mutation; consistency errors
/// carry the offending identifiers so a failing merge or validation can be
/// debugged from the message alone.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Wrong argument value or shape at a call site.
    #[error("configuration error: {0}")]
    Config(String),

    /// The same sample file name appears in both merge inputs.
    #[error("duplicate sample file name(s) across datasets: {}", names.join(", "))]
    DuplicateSampleNames { names: Vec<String> },

    /// The same feature name appears more than once where uniqueness is required.
    #[error("duplicate feature name(s): {}", names.join(", "))]
    DuplicateFeatureNames { names: Vec<String> },

    /// A table's row or column count disagrees with the intensity matrix.
    #[error("{table} has {actual} rows, {expected} expected")]
    ShapeMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// A required metadata column is absent.
    #[error("{table} lacks a '{column}' column")]
    MissingColumn { table: String, column: String },

    /// A required dataset field is absent or empty.
    #[error("missing required field '{field}'")]
    MissingField { field: String },

    /// A metadata column holds values of the wrong type.
    #[error("{table}['{column}'] is not {expected}: {detail}")]
    WrongType {
        table: String,
        column: String,
        expected: String,
        detail: String,
    },

    /// Neither merge mode applies to the two input shapes.
    #[error(
        "datasets cannot be merged: ({self_samples} samples x {self_features} features) \
         vs ({other_samples} samples x {other_features} features) match neither \
         sample-stacking nor feature-stacking"
    )]
    IncompatibleShapes {
        self_samples: usize,
        self_features: usize,
        other_samples: usize,
        other_features: usize,
    },

    /// The merged dataset failed basic validation.
    #[error("merged dataset failed validation: {0}")]
    MergedInvalid(String),

    /// A statistic cannot be computed from the available samples.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;
