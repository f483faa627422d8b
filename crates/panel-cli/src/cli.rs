//! CLI argument definitions for the quantpanel tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "quantpanel",
    version,
    about = "Manage quantified targeted-panel measurement datasets",
    long_about = "Validate, censor, filter, merge and export quantified \
                  targeted-panel datasets.\n\n\
                  Datasets are exchanged as a three-file CSV layout: \
                  <prefix>_intensityData.csv, <prefix>_sampleMetadata.csv and \
                  <prefix>_featureMetadata.csv."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the four-level conformance validation and print a report.
    Validate(ValidateArgs),

    /// Apply limits of quantification and write the censored dataset.
    Censor(CensorArgs),

    /// Narrow the QC masks and write the filtered dataset.
    Filter(FilterArgs),

    /// Merge two or more datasets into one.
    Merge(MergeArgs),

    /// Re-export a dataset, optionally as a combined single file.
    Export(ExportArgs),
}

#[derive(Parser)]
pub struct DatasetArgs {
    /// Path prefix of the dataset's three-file CSV layout.
    #[arg(value_name = "PREFIX")]
    pub prefix: PathBuf,

    /// Method description JSON (method name, external IDs, merge keys).
    #[arg(long = "method-json", value_name = "PATH")]
    pub method_json: Option<PathBuf>,

    /// Restrict the import to features measured in this unit.
    #[arg(long = "unit", value_name = "UNIT")]
    pub unit: Option<String>,
}

#[derive(Parser)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Report every check outcome, passing and failing.
    #[arg(long = "verbose-checks")]
    pub verbose_checks: bool,
}

#[derive(Parser)]
pub struct CensorArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Output path prefix for the censored dataset.
    #[arg(long = "output", value_name = "PREFIX")]
    pub output: PathBuf,

    /// Only censor below the lower limit; leave values above the ULOQ.
    #[arg(long = "only-lloq")]
    pub only_lloq: bool,
}

#[derive(Parser)]
pub struct FilterArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Output path prefix for the filtered dataset.
    #[arg(long = "output", value_name = "PREFIX")]
    pub output: PathBuf,

    /// Sample types to retain (repeatable).
    #[arg(long = "sample-type", value_name = "TYPE")]
    pub sample_types: Vec<String>,

    /// Assay roles to retain (repeatable).
    #[arg(long = "assay-role", value_name = "ROLE")]
    pub assay_roles: Vec<String>,

    /// Quantification types to retain (repeatable).
    #[arg(long = "quantification-type", value_name = "TYPE")]
    pub quantification_types: Vec<String>,

    /// Exclude features whose precision-reference RSD exceeds this.
    #[arg(long = "rsd-threshold", value_name = "PERCENT")]
    pub rsd_threshold: Option<f64>,

    /// Destructively drop the excluded rows and columns instead of only
    /// narrowing the masks.
    #[arg(long = "apply")]
    pub apply: bool,
}

#[derive(Parser)]
pub struct MergeArgs {
    /// Path prefixes of the datasets to merge, in order.
    #[arg(value_name = "PREFIX", num_args = 2..)]
    pub prefixes: Vec<PathBuf>,

    /// Method description JSON applied to every input.
    #[arg(long = "method-json", value_name = "PATH")]
    pub method_json: Option<PathBuf>,

    /// Output path prefix for the merged dataset.
    #[arg(long = "output", value_name = "PREFIX")]
    pub output: PathBuf,
}

#[derive(Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Output path prefix.
    #[arg(long = "output", value_name = "PREFIX")]
    pub output: PathBuf,

    /// Also write the combined single-file form.
    #[arg(long = "unified")]
    pub unified: bool,

    /// Replace commas in metadata text with semicolons.
    #[arg(long = "escape-delimiters")]
    pub escape_delimiters: bool,

    /// Rescale intensity by 100 / Dilution per sample.
    #[arg(long = "apply-dilution")]
    pub apply_dilution: bool,

    /// Keep masked-out rows and columns in the output files.
    #[arg(long = "keep-exclusions")]
    pub keep_exclusions: bool,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
