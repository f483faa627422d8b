//! Column-access helpers over polars frames.
//!
//! Metadata columns are loosely typed at the storage layer; these helpers
//! centralise the "column must exist" and per-row conversion plumbing so
//! callers get `PanelError`s that name the table and column.

use polars::prelude::{AnyValue, BooleanChunked, Column, DataFrame};

use crate::error::{PanelError, Result};
use crate::values::{any_to_f64, any_to_i64, any_to_string};

/// Fetch a column or fail with a consistency error naming the table.
pub fn require_column<'a>(df: &'a DataFrame, table: &str, column: &str) -> Result<&'a Column> {
    df.column(column).map_err(|_| PanelError::MissingColumn {
        table: table.to_string(),
        column: column.to_string(),
    })
}

/// All values of a column rendered to strings (null becomes "").
pub fn column_strings(df: &DataFrame, table: &str, column: &str) -> Result<Vec<String>> {
    let col = require_column(df, table, column)?;
    let mut out = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        out.push(any_to_string(col.get(idx).unwrap_or(AnyValue::Null)));
    }
    Ok(out)
}

/// All values of a column as f64 where convertible.
pub fn column_f64s(df: &DataFrame, table: &str, column: &str) -> Result<Vec<Option<f64>>> {
    let col = require_column(df, table, column)?;
    let mut out = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        out.push(any_to_f64(&col.get(idx).unwrap_or(AnyValue::Null)));
    }
    Ok(out)
}

/// All values of a column as i64 where convertible.
pub fn column_i64s(df: &DataFrame, table: &str, column: &str) -> Result<Vec<Option<i64>>> {
    let col = require_column(df, table, column)?;
    let mut out = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        out.push(any_to_i64(&col.get(idx).unwrap_or(AnyValue::Null)));
    }
    Ok(out)
}

/// Column names of a frame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Boolean mask vector as a polars chunked array, for row filtering.
pub fn mask_chunked(mask: &[bool]) -> BooleanChunked {
    BooleanChunked::from_slice("mask".into(), mask)
}

/// Names appearing more than once, in first-occurrence order.
pub fn duplicate_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut dupes = Vec::new();
    for name in names {
        let name = name.as_ref();
        if !seen.insert(name.to_string()) && !dupes.iter().any(|d: &String| d == name) {
            dupes.push(name.to_string());
        }
    }
    dupes
}
