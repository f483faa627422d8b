//! Subcommand drivers.

use anyhow::Context;
use tracing::info;

use panel_core::{CensorOptions, MaskFilter, apply_limits_of_quantification, merge_all, update_masks};
use panel_ingest::{CsvImporter, Importer};
use panel_model::{
    AssayRole, Attributes, Dataset, QuantificationType, SampleType,
};
use panel_report::{ExportOptions, export_dataset, export_unified_csv};
use panel_validate::{ValidationOptions, validate};

use crate::cli::{CensorArgs, DatasetArgs, ExportArgs, FilterArgs, MergeArgs, ValidateArgs};
use crate::summary::print_validation_summary;

fn load_attributes(path: Option<&std::path::Path>) -> anyhow::Result<Attributes> {
    match path {
        Some(path) => Attributes::from_json_file(path)
            .with_context(|| format!("loading method JSON {}", path.display())),
        None => Ok(Attributes::named("unspecified method")),
    }
}

fn load_dataset(args: &DatasetArgs) -> anyhow::Result<Dataset> {
    let attributes = load_attributes(args.method_json.as_deref())?;
    let name = args
        .prefix
        .file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());

    let mut importer = CsvImporter::new(&args.prefix);
    if let Some(unit) = &args.unit {
        importer = importer.with_unit(unit);
    }
    let mut dataset = importer
        .import_dataset(&name, attributes)
        .with_context(|| format!("importing {}", args.prefix.display()))?;
    dataset.file_paths.push(args.prefix.clone());
    Ok(dataset)
}

/// Validate a dataset and report per-level outcomes. Exit code 1 when the
/// dataset falls below the basic level.
pub fn run_validate(args: &ValidateArgs) -> anyhow::Result<i32> {
    let dataset = load_dataset(&args.dataset)?;
    let report = validate(
        &dataset,
        &ValidationOptions {
            verbose: args.verbose_checks,
            raise_warning: true,
            raise_error: false,
        },
    )?;
    print_validation_summary(&dataset.name, &report, args.verbose_checks);
    Ok(if report.basic() { 0 } else { 1 })
}

pub fn run_censor(args: &CensorArgs) -> anyhow::Result<i32> {
    let mut dataset = load_dataset(&args.dataset)?;
    let exempt = apply_limits_of_quantification(
        &mut dataset,
        &CensorOptions {
            only_lloq: args.only_lloq,
        },
    )?;
    if !exempt.is_empty() {
        info!("{} feature(s) exempt from censoring", exempt.len());
    }
    export_dataset(&dataset, &args.output, &ExportOptions::default())?;
    Ok(0)
}

pub fn run_filter(args: &FilterArgs) -> anyhow::Result<i32> {
    let mut dataset = load_dataset(&args.dataset)?;

    let mut filter = MaskFilter::default();
    if !args.sample_types.is_empty() {
        filter.sample_types = parse_all::<SampleType>(&args.sample_types)?;
    }
    if !args.assay_roles.is_empty() {
        filter.assay_roles = parse_all::<AssayRole>(&args.assay_roles)?;
    }
    if !args.quantification_types.is_empty() {
        filter.quantification_types = parse_all::<QuantificationType>(&args.quantification_types)?;
    }
    filter.rsd_threshold = args.rsd_threshold;

    update_masks(&mut dataset, &filter)?;
    if args.apply {
        dataset.apply_masks("QC filter")?;
    }
    export_dataset(&dataset, &args.output, &ExportOptions::default())?;
    Ok(0)
}

pub fn run_merge(args: &MergeArgs) -> anyhow::Result<i32> {
    let attributes = load_attributes(args.method_json.as_deref())?;
    let mut datasets = Vec::with_capacity(args.prefixes.len());
    for prefix in &args.prefixes {
        let dataset_args = DatasetArgs {
            prefix: prefix.clone(),
            method_json: args.method_json.clone(),
            unit: None,
        };
        let mut dataset = load_dataset(&dataset_args)?;
        dataset.attributes = attributes.clone();
        datasets.push(dataset);
    }

    let merged = merge_all(&datasets)?;
    info!(
        "merged {} dataset(s) into {} samples x {} features",
        datasets.len(),
        merged.n_samples(),
        merged.n_features()
    );
    export_dataset(&merged, &args.output, &ExportOptions::default())?;
    Ok(0)
}

pub fn run_export(args: &ExportArgs) -> anyhow::Result<i32> {
    let dataset = load_dataset(&args.dataset)?;
    let options = ExportOptions {
        escape_delimiters: args.escape_delimiters,
        with_exclusions: !args.keep_exclusions,
        apply_dilution: args.apply_dilution,
    };
    export_dataset(&dataset, &args.output, &options)?;
    if args.unified {
        export_unified_csv(&dataset, &args.output, &options)?;
    }
    Ok(0)
}

fn parse_all<T>(values: &[String]) -> anyhow::Result<Vec<T>>
where
    T: std::str::FromStr<Err = String>,
{
    values
        .iter()
        .map(|value| value.parse::<T>().map_err(anyhow::Error::msg))
        .collect()
}
