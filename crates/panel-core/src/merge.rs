//! Dataset merging.
//!
//! Two partially overlapping datasets combine in one of two mutually
//! exclusive modes:
//!
//! - **sample stacking** — both carry the identical feature axis; rows
//!   concatenate.
//! - **feature stacking** — both re-measured the same sample set; the
//!   feature axes are unified and the matrix realigned onto it.
//!
//! Merging is a pure function: both inputs are read-only and the output is
//! assembled independently, so a failure part-way leaves them untouched.
//! Feature stacking materialises a dense (samples x unified-features)
//! matrix with NaN for pairs absent from the owning source; storage is not
//! sparse-encoded.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::{Array2, Axis, concatenate};
use polars::prelude::{AnyValue, Column, DataFrame, DataType, IntoColumn, Series};
use tracing::{info, warn};

use panel_model::columns::sample;
use panel_model::frame::{column_names, column_strings, duplicate_names, mask_chunked};
use panel_model::values::parse_timestamp;
use panel_model::{Calibration, Dataset, ExclusionRecord, PanelError, Result};
use panel_validate::{ValidationOptions, validate};

/// How two datasets are being combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Same feature axis, disjoint samples; rows concatenate.
    SampleStacking,
    /// Same sample set, disjoint features; columns unify.
    FeatureStacking,
}

/// Select the merge mode from the two input shapes.
///
/// A feature-count match with identical feature metadata wins over an equal
/// sample count; neither condition holding is a consistency error rather
/// than a guess.
pub fn detect_mode(a: &Dataset, b: &Dataset) -> Result<MergeMode> {
    if a.n_features() == b.n_features() && a.feature_metadata.equals_missing(&b.feature_metadata) {
        Ok(MergeMode::SampleStacking)
    } else if a.n_samples() == b.n_samples() {
        Ok(MergeMode::FeatureStacking)
    } else {
        Err(PanelError::IncompatibleShapes {
            self_samples: a.n_samples(),
            self_features: a.n_features(),
            other_samples: b.n_samples(),
            other_features: b.n_features(),
        })
    }
}

/// Merge two datasets into a new one, leaving both inputs unmodified.
///
/// Both inputs must validate to the basic targeted-dataset level, and so
/// must the result; a postcondition failure is fatal. Given no name
/// collisions, repeated merges are commutative and associative over the
/// (sample, feature) -> value triple set, so batches may be folded in any
/// order (see [`merge_all`]).
pub fn merge(a: &Dataset, b: &Dataset) -> Result<Dataset> {
    ensure_basic(a, "first")?;
    ensure_basic(b, "second")?;

    let mode = detect_mode(a, b)?;
    let mut merged = match mode {
        MergeMode::SampleStacking => sample_stack(a, b)?,
        MergeMode::FeatureStacking => feature_stack(a, b)?,
    };

    merged.name = format!("{} - {}", a.name, b.name);
    merged.file_names = [a.file_names.clone(), b.file_names.clone()].concat();
    merged.file_paths = [a.file_paths.clone(), b.file_paths.clone()].concat();
    merged.variable_type = a.variable_type;

    // Out-of-schema values are carried, never silently dropped: each key
    // maps to a [first, second] pair with null for the side lacking it.
    let keys: BTreeSet<&String> = a.extensions.keys().chain(b.extensions.keys()).collect();
    let mut extensions = BTreeMap::new();
    for key in keys {
        info!("additional attribute '{key}' stored as a [first, second] list on the merged dataset");
        let pair = serde_json::Value::Array(vec![
            a.extensions.get(key).cloned().unwrap_or(serde_json::Value::Null),
            b.extensions.get(key).cloned().unwrap_or(serde_json::Value::Null),
        ]);
        extensions.insert(key.clone(), pair);
    }
    merged.extensions = extensions;

    // Calibration is not feature-aligned across merge inputs; the merged
    // dataset starts with an empty calibration consistent with its tables.
    if !a.calibration.is_empty() || !b.calibration.is_empty() {
        warn!("calibration data is not carried through a merge; re-import to recover it");
    }
    merged.calibration = Calibration::empty_for(&merged.sample_metadata, &merged.feature_metadata);

    let mut log = a.log.clone();
    log.extend(b.log.iter().cloned());
    merged.log = log;
    merged.push_log(format!(
        "Merged {} ({} samples, {} features) and {} ({} samples, {} features) into {} samples and {} features",
        a.name,
        a.n_samples(),
        a.n_features(),
        b.name,
        b.n_samples(),
        b.n_features(),
        merged.n_samples(),
        merged.n_features(),
    ));

    let report = validate(&merged, &quiet_validation())?;
    if !report.basic() {
        let detail = report
            .structural_failures
            .iter()
            .chain(&report.basic_failures)
            .cloned()
            .next()
            .unwrap_or_else(|| "unknown failure".to_string());
        return Err(PanelError::MergedInvalid(detail));
    }

    info!(
        "merged '{}' ({}x{}) and '{}' ({}x{}) into {}x{}",
        a.name,
        a.n_samples(),
        a.n_features(),
        b.name,
        b.n_samples(),
        b.n_features(),
        merged.n_samples(),
        merged.n_features(),
    );
    Ok(merged)
}

/// Fold a collection of datasets with [`merge`], left to right.
pub fn merge_all(datasets: &[Dataset]) -> Result<Dataset> {
    let Some((first, rest)) = datasets.split_first() else {
        return Err(PanelError::Config(
            "at least one dataset is required to merge".to_string(),
        ));
    };
    let mut accumulated = first.clone();
    for dataset in rest {
        accumulated = merge(&accumulated, dataset)?;
    }
    Ok(accumulated)
}

fn quiet_validation() -> ValidationOptions {
    ValidationOptions {
        verbose: false,
        raise_warning: false,
        raise_error: false,
    }
}

fn ensure_basic(dataset: &Dataset, which: &str) -> Result<()> {
    let report = validate(dataset, &quiet_validation())?;
    if report.basic() {
        Ok(())
    } else {
        let detail = report
            .structural_failures
            .iter()
            .chain(&report.basic_failures)
            .cloned()
            .next()
            .unwrap_or_else(|| "unknown failure".to_string());
        Err(PanelError::Config(format!(
            "{which} dataset does not satisfy the basic targeted dataset definition: {detail}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Mode A: sample stacking
// ---------------------------------------------------------------------------

fn sample_stack(a: &Dataset, b: &Dataset) -> Result<Dataset> {
    let mut all_names = a.sample_file_names()?;
    all_names.extend(b.sample_file_names()?);
    let dupes = duplicate_names(&all_names);
    if !dupes.is_empty() {
        return Err(PanelError::DuplicateSampleNames { names: dupes });
    }

    let sample_metadata = outer_stack(&[&a.sample_metadata, &b.sample_metadata])?;
    let sample_metadata = recompute_run_order(sample_metadata)?;

    let intensity = concatenate(Axis(0), &[a.intensity.view(), b.intensity.view()])
        .map_err(|e| PanelError::Config(format!("intensity concatenation failed: {e}")))?;

    let lod = match (&a.lod, &b.lod) {
        (Some(first), Some(second)) => Some(
            concatenate(Axis(0), &[first.view(), second.view()])
                .map_err(|e| PanelError::Config(format!("LOD concatenation failed: {e}")))?,
        ),
        (None, None) => None,
        _ => {
            warn!("limit-of-detection data present on only one input; dropped from the merge");
            None
        }
    };

    let mut sample_mask = a.sample_mask.clone();
    sample_mask.extend(&b.sample_mask);
    // Both sides describe the same features: excluded only when both agree.
    let feature_mask: Vec<bool> = a
        .feature_mask
        .iter()
        .zip(&b.feature_mask)
        .map(|(&x, &y)| x || y)
        .collect();
    warn_on_disagreeing_feature_masks(a, b);

    let mut exclusions = a.exclusions.clone();
    exclusions.extend(b.exclusions.iter().cloned());

    let mut attributes = a.attributes.clone();
    attributes.feature_metadata_not_exported =
        union(&a.attributes.feature_metadata_not_exported, &b.attributes.feature_metadata_not_exported);

    Ok(Dataset {
        name: String::new(),
        file_names: Vec::new(),
        file_paths: Vec::new(),
        variable_type: a.variable_type,
        attributes,
        intensity,
        sample_metadata,
        feature_metadata: a.feature_metadata.clone(),
        sample_mask,
        feature_mask,
        lod,
        calibration: Calibration::empty_for(&a.sample_metadata.clear(), &a.feature_metadata),
        exclusions,
        extensions: BTreeMap::new(),
        log: Vec::new(),
    })
}

/// Rebuild `Run Order` as the rank of `Acquired Time` over all rows; when
/// any timestamp is missing or unparseable there is no coherent ordering and
/// the column is null throughout.
fn recompute_run_order(mut df: DataFrame) -> Result<DataFrame> {
    let height = df.height();
    let timestamps: Option<Vec<chrono::NaiveDateTime>> =
        match column_strings(&df, "sampleMetadata", sample::ACQUIRED_TIME) {
            Ok(values) => values.iter().map(|v| parse_timestamp(v)).collect(),
            Err(_) => None,
        };

    let order_column = match timestamps {
        Some(times) => {
            let mut indices: Vec<usize> = (0..height).collect();
            indices.sort_by_key(|&i| times[i]);
            let mut ranks = vec![0i64; height];
            for (rank, &row) in indices.iter().enumerate() {
                ranks[row] = rank as i64;
            }
            Column::new(sample::RUN_ORDER.into(), &ranks)
        }
        None => Column::full_null(sample::RUN_ORDER.into(), height, &DataType::Int64),
    };
    df.with_column(order_column)?;
    Ok(df)
}

// ---------------------------------------------------------------------------
// Mode B: feature stacking
// ---------------------------------------------------------------------------

fn feature_stack(a: &Dataset, b: &Dataset) -> Result<Dataset> {
    let a_features = a.feature_names()?;
    let b_features = b.feature_names()?;
    let mut all_features = a_features.clone();
    all_features.extend(b_features.clone());
    let dupes = duplicate_names(&all_features);
    if !dupes.is_empty() {
        return Err(PanelError::DuplicateFeatureNames { names: dupes });
    }

    let (matched, dropped_a, dropped_b) = match_samples(a, b)?;
    if matched.is_empty() {
        return Err(PanelError::Config(
            "feature-stacking merge requires at least one sample file name in common".to_string(),
        ));
    }

    // Unified feature table: provenance columns batch-suffixed per side,
    // key columns shared, then the two renamed tables stacked row-wise.
    let exempt = merge_key_columns(a, b);
    let (renames_a, renames_b) =
        plan_feature_renames(&column_names(&a.feature_metadata), &column_names(&b.feature_metadata), &exempt);
    let renamed_a = apply_renames(&a.feature_metadata, &renames_a)?;
    let renamed_b = apply_renames(&b.feature_metadata, &renames_b)?;
    let feature_metadata = outer_stack(&[&renamed_a, &renamed_b])?;

    // Realign the matrix onto (matched samples x unified features).
    let a_index = feature_index(&a_features)?;
    let b_index = feature_index(&b_features)?;
    let unified: Vec<String> = all_features;
    let mut intensity = Array2::from_elem((matched.len(), unified.len()), f64::NAN);
    for (column, name) in unified.iter().enumerate() {
        if let Some(&source_col) = a_index.get(name.as_str()) {
            for (row, &(ai, _)) in matched.iter().enumerate() {
                intensity[[row, column]] = a.intensity[[ai, source_col]];
            }
        } else if let Some(&source_col) = b_index.get(name.as_str()) {
            for (row, &(_, bi)) in matched.iter().enumerate() {
                intensity[[row, column]] = b.intensity[[bi, source_col]];
            }
        }
    }

    // Sample metadata follows the first input's matched rows; no single
    // acquisition ordering is meaningful across measurement methods.
    let keep_a: Vec<bool> = {
        let matched_rows: BTreeSet<usize> = matched.iter().map(|&(ai, _)| ai).collect();
        (0..a.n_samples()).map(|i| matched_rows.contains(&i)).collect()
    };
    let sample_metadata = a.sample_metadata.filter(&mask_chunked(&keep_a))?;
    let sample_metadata = null_run_order(sample_metadata)?;

    let sample_mask: Vec<bool> = matched
        .iter()
        .map(|&(ai, bi)| a.sample_mask[ai] && b.sample_mask[bi])
        .collect();
    // Each unified feature exists in exactly one source; its mask value
    // carries over verbatim.
    let mut feature_mask = a.feature_mask.clone();
    feature_mask.extend(&b.feature_mask);
    warn_on_disagreeing_feature_masks(a, b);

    let mut exclusions = a.exclusions.clone();
    exclusions.extend(b.exclusions.iter().cloned());
    exclusions.extend(dropped_a);
    exclusions.extend(dropped_b);

    if a.lod.is_some() || b.lod.is_some() {
        warn!("limit-of-detection data is not carried through a feature-stacking merge");
    }

    let mut attributes = a.attributes.clone();
    attributes.feature_metadata_not_exported = union(
        &apply_name_map(&a.attributes.feature_metadata_not_exported, &renames_a),
        &apply_name_map(&b.attributes.feature_metadata_not_exported, &renames_b),
    );

    Ok(Dataset {
        name: String::new(),
        file_names: Vec::new(),
        file_paths: Vec::new(),
        variable_type: a.variable_type,
        attributes,
        intensity,
        sample_metadata: sample_metadata.clone(),
        feature_metadata: feature_metadata.clone(),
        sample_mask,
        feature_mask,
        lod: None,
        calibration: Calibration::empty_for(&sample_metadata, &feature_metadata),
        exclusions,
        extensions: BTreeMap::new(),
        log: Vec::new(),
    })
}

/// Pair up rows by sample file name: `(row in a, row in b)` for the
/// intersection in the first input's order, plus exclusion records for the
/// rows only one side carries.
#[allow(clippy::type_complexity)]
fn match_samples(
    a: &Dataset,
    b: &Dataset,
) -> Result<(Vec<(usize, usize)>, Vec<ExclusionRecord>, Vec<ExclusionRecord>)> {
    let a_names = a.sample_file_names()?;
    let b_names = b.sample_file_names()?;
    for (names, dataset) in [(&a_names, "first"), (&b_names, "second")] {
        let dupes = duplicate_names(names);
        if !dupes.is_empty() {
            warn!("duplicate sample file names within the {dataset} input");
            return Err(PanelError::DuplicateSampleNames { names: dupes });
        }
    }

    let b_index: HashMap<&str, usize> = b_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut matched = Vec::new();
    for (ai, name) in a_names.iter().enumerate() {
        if let Some(&bi) = b_index.get(name.as_str()) {
            matched.push((ai, bi));
        }
    }

    let matched_a: BTreeSet<usize> = matched.iter().map(|&(ai, _)| ai).collect();
    let matched_b: BTreeSet<usize> = matched.iter().map(|&(_, bi)| bi).collect();
    let dropped_a = drop_unmatched(a, &a_names, &matched_a, "first")?;
    let dropped_b = drop_unmatched(b, &b_names, &matched_b, "second")?;
    Ok((matched, dropped_a, dropped_b))
}

fn drop_unmatched(
    dataset: &Dataset,
    names: &[String],
    matched: &BTreeSet<usize>,
    which: &str,
) -> Result<Vec<ExclusionRecord>> {
    let dropped: Vec<usize> = (0..dataset.n_samples())
        .filter(|i| !matched.contains(i))
        .collect();
    if dropped.is_empty() {
        return Ok(Vec::new());
    }

    let dropped_names: Vec<&str> = dropped.iter().map(|&i| names[i].as_str()).collect();
    warn!(
        "sample file name(s) present only in the {which} input are dropped from the merge: {}",
        dropped_names.join(", ")
    );
    let drop_mask: Vec<bool> = (0..dataset.n_samples())
        .map(|i| !matched.contains(&i))
        .collect();
    Ok(vec![ExclusionRecord {
        samples: dataset.sample_metadata.filter(&mask_chunked(&drop_mask))?,
        features: dataset.feature_metadata.clear(),
        intensity: dataset.intensity.select(Axis(0), &dropped),
        reason: format!("not present in both datasets during merge ({which} input)"),
    }])
}

/// Columns kept un-suffixed during feature stacking: the fixed key set, the
/// declared external identifiers, and additional quantification parameters
/// present on both sides.
fn merge_key_columns(a: &Dataset, b: &Dataset) -> BTreeSet<String> {
    use panel_model::columns::feature;

    let mut keys: BTreeSet<String> = [
        feature::NAME,
        feature::CALIBRATION_METHOD,
        feature::QUANTIFICATION_TYPE,
        feature::UNIT,
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect();
    keys.extend(a.attributes.external_ids.iter().cloned());
    keys.extend(b.attributes.external_ids.iter().cloned());

    let a_cols: BTreeSet<String> = column_names(&a.feature_metadata).into_iter().collect();
    let b_cols: BTreeSet<String> = column_names(&b.feature_metadata).into_iter().collect();
    for col in a
        .attributes
        .additional_quant_param_columns
        .iter()
        .chain(&b.attributes.additional_quant_param_columns)
    {
        if a_cols.contains(col) && b_cols.contains(col) {
            keys.insert(col.clone());
        }
    }
    keys
}

/// Split `name` into a `_batch<n>` suffixed stem, when it has one.
fn batch_suffix(name: &str) -> Option<(&str, u32)> {
    let (stem, tail) = name.rsplit_once("_batch")?;
    let number = tail.parse::<u32>().ok()?;
    Some((stem, number))
}

/// Plan the batch-suffix renames for both sides so no non-key column name
/// collides. Fresh suffix numbers continue after every number already in
/// use; a side whose existing numbers collide with the other side's is
/// shifted wholesale, keeping earlier merges' provenance readable.
fn plan_feature_renames(
    a_cols: &[String],
    b_cols: &[String],
    exempt: &BTreeSet<String>,
) -> (Vec<(String, String)>, Vec<(String, String)>) {
    let suffixes = |cols: &[String]| -> BTreeSet<u32> {
        cols.iter()
            .filter(|c| !exempt.contains(*c))
            .filter_map(|c| batch_suffix(c).map(|(_, n)| n))
            .collect()
    };
    let a_existing = suffixes(a_cols);
    let b_existing = suffixes(b_cols);

    let shift_b = if a_existing.is_disjoint(&b_existing) {
        0
    } else {
        a_existing.iter().max().copied().unwrap_or(0)
    };

    let mut used: BTreeSet<u32> = a_existing.clone();
    used.extend(b_existing.iter().map(|n| n + shift_b));

    let mut next_fresh = used.iter().max().copied().unwrap_or(0) + 1;
    let mut plan = |cols: &[String], shift: u32| -> Vec<(String, String)> {
        let mut fresh: Option<u32> = None;
        cols.iter()
            .filter(|c| !exempt.contains(*c))
            .map(|col| {
                let renamed = match batch_suffix(col) {
                    Some((stem, n)) => format!("{stem}_batch{}", n + shift),
                    None => {
                        let n = *fresh.get_or_insert_with(|| {
                            let n = next_fresh;
                            next_fresh += 1;
                            n
                        });
                        format!("{col}_batch{n}")
                    }
                };
                (col.clone(), renamed)
            })
            .filter(|(old, new)| old != new)
            .collect()
    };

    let renames_a = plan(a_cols, 0);
    let renames_b = plan(b_cols, shift_b);
    (renames_a, renames_b)
}

fn apply_renames(df: &DataFrame, renames: &[(String, String)]) -> Result<DataFrame> {
    let mut renamed = df.clone();
    for (old, new) in renames {
        renamed.rename(old, new.as_str().into())?;
    }
    Ok(renamed)
}

fn apply_name_map(names: &[String], renames: &[(String, String)]) -> Vec<String> {
    names
        .iter()
        .map(|name| {
            renames
                .iter()
                .find(|(old, _)| old == name)
                .map(|(_, new)| new.clone())
                .unwrap_or_else(|| name.clone())
        })
        .collect()
}

fn feature_index(names: &[String]) -> Result<HashMap<&str, usize>> {
    let mut index = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        if index.insert(name.as_str(), i).is_some() {
            return Err(PanelError::DuplicateFeatureNames {
                names: vec![name.clone()],
            });
        }
    }
    Ok(index)
}

fn warn_on_disagreeing_feature_masks(a: &Dataset, b: &Dataset) {
    if a.feature_mask.iter().any(|&m| !m) || b.feature_mask.iter().any(|&m| !m) {
        warn!(
            "feature masks are not all-included and will be reconciled: shared features stay \
             excluded only when both sides agree, single-source features keep their value"
        );
    }
}

fn union(a: &[String], b: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = a.to_vec();
    for name in b {
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Row stacking with schema union
// ---------------------------------------------------------------------------

/// Stack frames row-wise over the union of their columns, padding with
/// nulls where a frame lacks a column. Column order is first-seen order.
fn outer_stack(frames: &[&DataFrame]) -> Result<DataFrame> {
    let mut ordered_columns: Vec<String> = Vec::new();
    for frame in frames {
        for name in column_names(frame) {
            if !ordered_columns.contains(&name) {
                ordered_columns.push(name);
            }
        }
    }

    let mut columns = Vec::with_capacity(ordered_columns.len());
    for name in &ordered_columns {
        let mut values: Vec<AnyValue<'static>> = Vec::new();
        for frame in frames {
            match frame.column(name) {
                Ok(col) => {
                    for idx in 0..frame.height() {
                        values.push(col.get(idx).unwrap_or(AnyValue::Null).into_static());
                    }
                }
                Err(_) => values.extend(std::iter::repeat_n(AnyValue::Null, frame.height())),
            }
        }
        let series = Series::from_any_values(name.as_str().into(), &values, false)?;
        columns.push(series.into_column());
    }
    Ok(DataFrame::new(columns)?)
}

fn null_run_order(mut df: DataFrame) -> Result<DataFrame> {
    let height = df.height();
    df.with_column(Column::full_null(sample::RUN_ORDER.into(), height, &DataType::Int64))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn batch_suffix_parses_only_trailing_numbers() {
        assert_eq!(batch_suffix("LLOQ_batch1"), Some(("LLOQ", 1)));
        assert_eq!(batch_suffix("LOD_batch12"), Some(("LOD", 12)));
        assert_eq!(batch_suffix("LLOQ"), None);
        assert_eq!(batch_suffix("LLOQ_batchx"), None);
    }

    #[test]
    fn fresh_sides_get_distinct_suffixes() {
        let exempt: BTreeSet<String> = ["Feature Name".to_string()].into_iter().collect();
        let a = vec!["Feature Name".to_string(), "LLOQ".to_string()];
        let b = vec!["Feature Name".to_string(), "LLOQ".to_string()];
        let (ra, rb) = plan_feature_renames(&a, &b, &exempt);
        assert_eq!(ra, vec![("LLOQ".to_string(), "LLOQ_batch1".to_string())]);
        assert_eq!(rb, vec![("LLOQ".to_string(), "LLOQ_batch2".to_string())]);
    }

    #[test]
    fn previously_merged_side_keeps_numbers_and_fresh_continues() {
        let exempt: BTreeSet<String> = ["Feature Name".to_string()].into_iter().collect();
        let a = vec![
            "Feature Name".to_string(),
            "LLOQ_batch1".to_string(),
            "LLOQ_batch2".to_string(),
        ];
        let b = vec!["Feature Name".to_string(), "LLOQ".to_string()];
        let (ra, rb) = plan_feature_renames(&a, &b, &exempt);
        assert!(ra.is_empty());
        assert_eq!(rb, vec![("LLOQ".to_string(), "LLOQ_batch3".to_string())]);
    }

    #[test]
    fn colliding_suffix_numbers_shift_the_second_side() {
        let exempt: BTreeSet<String> = ["Feature Name".to_string()].into_iter().collect();
        let a = vec!["Feature Name".to_string(), "LLOQ_batch1".to_string()];
        let b = vec!["Feature Name".to_string(), "LLOQ_batch1".to_string()];
        let (ra, rb) = plan_feature_renames(&a, &b, &exempt);
        assert!(ra.is_empty());
        assert_eq!(rb, vec![("LLOQ_batch1".to_string(), "LLOQ_batch2".to_string())]);
    }

    #[test]
    fn outer_stack_pads_missing_columns_with_null() {
        let first = df!(
            "Sample File Name" => &["a"],
            "Batch" => &[1i64],
        )
        .unwrap();
        let second = df!(
            "Sample File Name" => &["b"],
            "Dilution" => &[50.0],
        )
        .unwrap();
        let stacked = outer_stack(&[&first, &second]).unwrap();
        assert_eq!(stacked.height(), 2);
        assert_eq!(
            column_names(&stacked),
            vec!["Sample File Name", "Batch", "Dilution"]
        );
        assert_eq!(
            stacked.column("Batch").unwrap().get(1).unwrap(),
            AnyValue::Null
        );
    }

    #[test]
    fn run_order_ranks_follow_acquired_time() {
        let frame = df!(
            "Sample File Name" => &["a", "b", "c"],
            "Acquired Time" => &[
                "2024-03-01T10:00:00",
                "2024-03-01T08:00:00",
                "2024-03-01T09:00:00",
            ],
            "Run Order" => &[5i64, 6, 7],
        )
        .unwrap();
        let ranked = recompute_run_order(frame).unwrap();
        let order: Vec<Option<i64>> = (0..3)
            .map(|i| match ranked.column("Run Order").unwrap().get(i).unwrap() {
                AnyValue::Int64(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![Some(2), Some(0), Some(1)]);
    }

    #[test]
    fn unparseable_timestamps_null_the_run_order() {
        let frame = df!(
            "Sample File Name" => &["a", "b"],
            "Acquired Time" => &["2024-03-01T10:00:00", "yesterday"],
            "Run Order" => &[1i64, 2],
        )
        .unwrap();
        let ranked = recompute_run_order(frame).unwrap();
        assert_eq!(
            ranked.column("Run Order").unwrap().get(0).unwrap(),
            AnyValue::Null
        );
    }
}
