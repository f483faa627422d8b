use ndarray::array;
use polars::df;

use panel_model::{Attributes, Dataset, PanelError};
use panel_validate::{Level, ValidationOptions, validate};

/// A dataset carrying every column required up to the fully-annotated level.
fn annotated_dataset() -> Dataset {
    let intensity = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
    let samples = df!(
        "Sample File Name" => &["a.raw", "b.raw", "c.raw"],
        "Sample Base Name" => &["a", "b", "c"],
        "Sample ID" => &["S1", "S2", "S3"],
        "Subject ID" => &["P1", "P2", "P3"],
        "AssayRole" => &["Assay", "Precision Reference", "Assay"],
        "SampleType" => &["Study Sample", "Study Pool", "Study Sample"],
        "Dilution" => &[100.0, 100.0, 100.0],
        "Batch" => &[1i64, 1, 1],
        "Correction Batch" => &[1i64, 1, 1],
        "Run Order" => &[1i64, 2, 3],
        "Acquired Time" => &[
            "2024-03-01T09:00:00",
            "2024-03-01T10:00:00",
            "2024-03-01T11:00:00",
        ],
    )
    .unwrap();
    let features = df!(
        "Feature Name" => &["alanine", "glycine"],
        "quantificationType" => &[
            "Quantified with IS",
            "Monitored for relative information",
        ],
        "calibrationMethod" => &[
            "Backcalculated with Internal Standard",
            "No calibration",
        ],
        "Unit" => &["µM", "µM"],
        "LLOQ" => &[0.1, 0.2],
        "ULOQ" => &[100.0, 50.0],
        "LOD" => &[0.05, 0.1],
    )
    .unwrap();
    Dataset::new(
        "unit",
        intensity,
        samples,
        features,
        None,
        Attributes::named("test method"),
    )
    .unwrap()
}

fn quiet() -> ValidationOptions {
    ValidationOptions {
        verbose: false,
        raise_warning: false,
        raise_error: false,
    }
}

#[test]
fn annotated_dataset_passes_all_levels() {
    let dataset = annotated_dataset();
    let report = validate(&dataset, &quiet()).unwrap();
    assert!(report.structural());
    assert!(report.basic());
    assert!(report.qc_ready());
    assert!(report.fully_annotated());
    assert!(report.checks.iter().all(|c| c.passed));
}

#[test]
fn missing_subject_id_degrades_annotation_only() {
    let mut dataset = annotated_dataset();
    dataset.sample_metadata = dataset.sample_metadata.drop("Subject ID").unwrap();
    let report = validate(&dataset, &quiet()).unwrap();
    assert!(report.qc_ready());
    assert!(!report.fully_annotated());
    assert_eq!(report.annotation_failures.len(), 1);
    assert!(report.annotation_failures[0].contains("Subject ID"));
}

#[test]
fn wrongly_typed_run_order_fails_qc() {
    let mut dataset = annotated_dataset();
    dataset.sample_metadata = dataset.sample_metadata.drop("Run Order").unwrap();
    let order = polars::prelude::Column::new("Run Order".into(), &[1.5f64, 2.5, 3.5]);
    dataset.sample_metadata.with_column(order).unwrap();

    let report = validate(&dataset, &quiet()).unwrap();
    assert!(report.basic());
    assert!(!report.qc_ready());
    assert!(!report.fully_annotated());
    assert!(report.qc_failures.iter().any(|f| f.contains("Run Order")));
}

#[test]
fn invalid_sample_type_values_fail_qc() {
    let mut dataset = annotated_dataset();
    dataset.sample_metadata = dataset.sample_metadata.drop("SampleType").unwrap();
    let bad = polars::prelude::Column::new(
        "SampleType".into(),
        &["Study Sample", "Mystery", "Study Sample"],
    );
    dataset.sample_metadata.with_column(bad).unwrap();

    let report = validate(&dataset, &quiet()).unwrap();
    assert!(!report.qc_ready());
    assert!(report.qc_failures.iter().any(|f| f.contains("Mystery")));
}

#[test]
fn structural_failure_short_circuits_lower_levels() {
    let mut dataset = annotated_dataset();
    dataset.sample_mask.pop();
    let report = validate(&dataset, &quiet()).unwrap();
    assert!(!report.structural());
    assert!(!report.basic());
    assert!(
        report
            .basic_failures
            .iter()
            .any(|f| f.contains("not checked"))
    );
}

#[test]
fn raise_error_returns_typed_error_for_basic_failure() {
    let mut dataset = annotated_dataset();
    dataset.feature_metadata = dataset.feature_metadata.drop("Unit").unwrap();
    let options = ValidationOptions {
        raise_error: true,
        raise_warning: false,
        verbose: false,
    };
    let err = validate(&dataset, &options).unwrap_err();
    assert!(matches!(err, PanelError::MissingColumn { .. }));
}

#[test]
fn qc_failure_does_not_abort_in_raise_error_mode() {
    let mut dataset = annotated_dataset();
    dataset.sample_metadata = dataset.sample_metadata.drop("Sample Base Name").unwrap();
    let options = ValidationOptions {
        raise_error: true,
        raise_warning: false,
        verbose: false,
    };
    let report = validate(&dataset, &options).unwrap();
    assert!(report.basic());
    assert!(!report.qc_ready());
}

#[test]
fn batch_suffixed_limit_columns_are_accepted() {
    let mut dataset = annotated_dataset();
    dataset.feature_metadata = dataset.feature_metadata.drop("LLOQ").unwrap();
    let suffixed = polars::prelude::Column::new("LLOQ_batch1".into(), &[0.1f64, 0.2]);
    dataset.feature_metadata.with_column(suffixed).unwrap();

    let report = validate(&dataset, &quiet()).unwrap();
    assert!(report.basic());
}

#[test]
fn level_report_summary_is_stable() {
    let mut dataset = annotated_dataset();
    dataset.sample_metadata = dataset.sample_metadata.drop("Sample ID").unwrap();
    let report = validate(&dataset, &quiet()).unwrap();

    #[derive(serde::Serialize)]
    struct Summary {
        structural: bool,
        basic: bool,
        qc_ready: bool,
        fully_annotated: bool,
    }
    let summary = Summary {
        structural: report.structural(),
        basic: report.basic(),
        qc_ready: report.qc_ready(),
        fully_annotated: report.fully_annotated(),
    };
    insta::assert_json_snapshot!(summary, @r#"
    {
      "structural": true,
      "basic": true,
      "qc_ready": true,
      "fully_annotated": false
    }
    "#);
}

#[test]
fn levels_expose_failure_lists() {
    let dataset = annotated_dataset();
    let report = validate(&dataset, &quiet()).unwrap();
    assert!(report.failures(Level::Structural).is_empty());
    assert!(report.passes(Level::FullyAnnotated));
}
