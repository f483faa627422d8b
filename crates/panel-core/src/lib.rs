//! Core operations over targeted-panel datasets: limit-of-quantification
//! censoring, QC mask filtering, reproducibility statistics and the dataset
//! merge engine.

pub mod censor;
pub mod masks;
pub mod merge;
pub mod stats;

pub use censor::{CensorOptions, apply_limits_of_quantification};
pub use masks::{MaskFilter, update_masks};
pub use merge::{MergeMode, detect_mode, merge, merge_all};
pub use stats::{rsd_sp, rsd_ss};
