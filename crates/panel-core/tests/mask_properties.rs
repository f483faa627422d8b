//! Property tests for the mask engine: updates only ever narrow, and
//! repeating an update changes nothing.

use ndarray::Array2;
use polars::df;
use proptest::prelude::{any, proptest};

use panel_core::{MaskFilter, update_masks};
use panel_model::{AssayRole, Attributes, Dataset, QuantificationType, SampleType};

const SAMPLE_ROLES: [&str; 6] = [
    "Assay",
    "Precision Reference",
    "Assay",
    "Blank",
    "Linearity Reference",
    "Assay",
];
const SAMPLE_TYPES: [&str; 6] = [
    "Study Sample",
    "Study Pool",
    "Study Sample",
    "Procedural Blank",
    "External Reference",
    "Study Sample",
];
const QUANT_TYPES: [&str; 4] = [
    "Quantified with IS",
    "Monitored for relative information",
    "Other quantification",
    "Quantified and validated with own labeled analogue",
];

fn fixture() -> Dataset {
    let intensity = Array2::from_shape_fn((6, 4), |(i, j)| (i * 10 + j) as f64 + 1.0);
    let samples = df!(
        "Sample File Name" => &["s1", "s2", "s3", "s4", "s5", "s6"],
        "AssayRole" => &SAMPLE_ROLES,
        "SampleType" => &SAMPLE_TYPES,
    )
    .unwrap();
    let features = df!(
        "Feature Name" => &["f1", "f2", "f3", "f4"],
        "quantificationType" => &QUANT_TYPES,
    )
    .unwrap();
    Dataset::new("props", intensity, samples, features, None, Attributes::default()).unwrap()
}

fn all_sample_types() -> Vec<SampleType> {
    vec![
        SampleType::StudySample,
        SampleType::StudyPool,
        SampleType::ExternalReference,
        SampleType::MethodReference,
        SampleType::ProceduralBlank,
    ]
}

fn all_assay_roles() -> Vec<AssayRole> {
    vec![
        AssayRole::Assay,
        AssayRole::PrecisionReference,
        AssayRole::LinearityReference,
        AssayRole::Blank,
    ]
}

proptest! {
    #[test]
    fn update_masks_is_monotonic_and_idempotent(
        sample_pre in proptest::collection::vec(any::<bool>(), 6),
        feature_pre in proptest::collection::vec(any::<bool>(), 4),
        sample_types in proptest::sample::subsequence(all_sample_types(), 1..=5),
        assay_roles in proptest::sample::subsequence(all_assay_roles(), 1..=4),
        quantification_types in proptest::sample::subsequence(
            QuantificationType::all().to_vec(),
            1..=5,
        ),
    ) {
        let mut dataset = fixture();
        dataset.sample_mask = sample_pre.clone();
        dataset.feature_mask = feature_pre.clone();

        let filter = MaskFilter {
            sample_types,
            assay_roles,
            quantification_types,
            ..MaskFilter::default()
        };
        update_masks(&mut dataset, &filter).unwrap();

        // Monotonic: nothing excluded before the call is re-included.
        for (before, after) in sample_pre.iter().zip(&dataset.sample_mask) {
            assert!(*after <= *before);
        }
        for (before, after) in feature_pre.iter().zip(&dataset.feature_mask) {
            assert!(*after <= *before);
        }

        // Idempotent: a second identical call is a no-op.
        let sample_once = dataset.sample_mask.clone();
        let feature_once = dataset.feature_mask.clone();
        update_masks(&mut dataset, &filter).unwrap();
        assert_eq!(dataset.sample_mask, sample_once);
        assert_eq!(dataset.feature_mask, feature_once);
    }
}

#[test]
fn excluded_feature_stays_excluded_when_later_allowed() {
    let mut dataset = fixture();

    // First call excludes the monitored feature (f2).
    let narrow = MaskFilter {
        quantification_types: vec![QuantificationType::IsQuantified],
        ..MaskFilter::default()
    };
    update_masks(&mut dataset, &narrow).unwrap();
    assert!(!dataset.feature_mask[1]);

    // A later call allowing Monitored must not widen the mask.
    let wide = MaskFilter {
        quantification_types: vec![
            QuantificationType::IsQuantified,
            QuantificationType::Monitored,
        ],
        ..MaskFilter::default()
    };
    update_masks(&mut dataset, &wide).unwrap();
    assert!(!dataset.feature_mask[1]);
}

#[test]
fn shape_invariants_hold_after_mask_updates() {
    let mut dataset = fixture();
    update_masks(&mut dataset, &MaskFilter::default()).unwrap();
    assert!(dataset.check_shape_invariants().is_ok());
}
