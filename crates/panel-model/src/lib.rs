pub mod attributes;
pub mod columns;
pub mod dataset;
pub mod enums;
pub mod error;
pub mod frame;
pub mod values;

pub use attributes::Attributes;
pub use dataset::{
    ABOVE_LOQ, ABOVE_LOQ_TOKEN, BELOW_LOQ, BELOW_LOQ_TOKEN, Calibration, Dataset, ExclusionRecord,
    LogEntry,
};
pub use enums::{AssayRole, CalibrationMethod, QuantificationType, SampleType, VariableType};
pub use error::{PanelError, Result};
