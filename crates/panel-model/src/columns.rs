//! Canonical column names for the two metadata tables.
//!
//! These strings are the persisted interchange format: exports write them as
//! CSV headers and the importer matches on them, so they live in one place.

/// Sample-metadata column names (one row per acquired sample).
pub mod sample {
    /// Acquisition file name; the sample's unique key during merge.
    pub const FILE_NAME: &str = "Sample File Name";
    /// File name stripped of injection suffixes, used for LIMS matching.
    pub const BASE_NAME: &str = "Sample Base Name";
    pub const SAMPLE_ID: &str = "Sample ID";
    pub const SUBJECT_ID: &str = "Subject ID";
    pub const ASSAY_ROLE: &str = "AssayRole";
    pub const SAMPLE_TYPE: &str = "SampleType";
    /// Dilution factor in percent; exports rescale intensity by 100 / value.
    pub const DILUTION: &str = "Dilution";
    pub const BATCH: &str = "Batch";
    pub const CORRECTION_BATCH: &str = "Correction Batch";
    pub const RUN_ORDER: &str = "Run Order";
    pub const ACQUIRED_TIME: &str = "Acquired Time";
    pub const EXCLUSION_DETAILS: &str = "Exclusion Details";
    pub const METADATA_AVAILABLE: &str = "Metadata Available";
}

/// Feature-metadata column names (one row per measured analyte).
pub mod feature {
    /// Analyte name; must be unique within a dataset.
    pub const NAME: &str = "Feature Name";
    pub const QUANTIFICATION_TYPE: &str = "quantificationType";
    pub const CALIBRATION_METHOD: &str = "calibrationMethod";
    pub const UNIT: &str = "Unit";
    pub const LLOQ: &str = "LLOQ";
    pub const ULOQ: &str = "ULOQ";
    pub const LOD: &str = "LOD";
}

/// Timestamp format written to and read from exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
