pub mod validator;

pub use validator::{CheckOutcome, Level, ValidationOptions, ValidationReport, validate};
