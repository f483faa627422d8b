//! Method-level configuration carried by every dataset.
//!
//! A quantification method ships a JSON description (name, external
//! identifier columns, merge keys, export filters); the importer loads it
//! once and the dataset carries it for the rest of its life.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Attributes {
    /// Name of the quantification method that produced the dataset.
    pub method_name: String,

    /// Externally defined identifier columns (e.g. "PubChem ID"); each entry
    /// must also exist as a feature-metadata column.
    pub external_ids: Vec<String>,

    /// Extra feature-metadata columns treated as merge keys when present in
    /// both inputs; expected identical across batches.
    pub additional_quant_param_columns: Vec<String>,

    /// Feature-metadata columns the exporter filters out.
    pub feature_metadata_not_exported: Vec<String>,

    /// Sample-metadata columns the exporter filters out.
    pub sample_metadata_not_exported: Vec<String>,

    /// Default RSD threshold applied by mask filtering when the caller
    /// passes none.
    pub rsd_threshold: Option<f64>,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            method_name: String::new(),
            external_ids: Vec::new(),
            additional_quant_param_columns: Vec::new(),
            feature_metadata_not_exported: Vec::new(),
            sample_metadata_not_exported: vec!["Exclusion Details".to_string()],
            rsd_threshold: None,
        }
    }
}

impl Attributes {
    /// Minimal attribute set for a named method.
    pub fn named(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            ..Self::default()
        }
    }

    /// Load a method description from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| PanelError::Config(format!("invalid method JSON {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_exports_everything_but_exclusion_details() {
        let attributes = Attributes::default();
        assert!(attributes.feature_metadata_not_exported.is_empty());
        assert_eq!(
            attributes.sample_metadata_not_exported,
            vec!["Exclusion Details".to_string()]
        );
    }

    #[test]
    fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("method.json");
        std::fs::write(
            &path,
            r#"{
                "methodName": "amino acids v2",
                "externalIds": ["PubChem ID"],
                "rsdThreshold": 30.0
            }"#,
        )
        .unwrap();

        let attributes = Attributes::from_json_file(&path).unwrap();
        assert_eq!(attributes.method_name, "amino acids v2");
        assert_eq!(attributes.external_ids, vec!["PubChem ID".to_string()]);
        assert_eq!(attributes.rsd_threshold, Some(30.0));
    }

    #[test]
    fn invalid_json_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("method.json");
        std::fs::write(&path, "not json").unwrap();

        let err = Attributes::from_json_file(&path).unwrap_err();
        assert!(matches!(err, PanelError::Config(_)));
    }
}
