//! YAML manifests
//!
//! Manifests are plain Kubernetes documents. Templates may carry a
//! `PG_VERSION` placeholder that is substituted before parsing.

use crate::error::LifecycleError;
use crate::postgres::render_manifest_version;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

fn ensure_mapping(document: Value) -> Result<Value, LifecycleError> {
    if !document.is_object() {
        return Err(LifecycleError::Malformed(
            "manifest must be a mapping".to_string(),
        ));
    }
    Ok(document)
}

/// Parse a single YAML document into a JSON value
///
/// Files holding several `---` separated documents are rejected; use
/// [`parse_manifests`] for those.
pub fn parse_manifest(yaml: &str) -> Result<Value, LifecycleError> {
    ensure_mapping(serde_yaml::from_str(yaml)?)
}

/// Parse every document of a multi-document YAML stream, skipping empty ones
pub fn parse_manifests(yaml: &str) -> Result<Vec<Value>, LifecycleError> {
    serde_yaml::Deserializer::from_str(yaml)
        .map(Value::deserialize)
        .filter(|document| !matches!(document, Ok(Value::Null)))
        .map(|document| ensure_mapping(document?))
        .collect()
}

/// Read and parse a single-document manifest file
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Value, LifecycleError> {
    let yaml = std::fs::read_to_string(path)?;
    parse_manifest(&yaml)
}

/// Read and parse every document of a manifest file
pub fn load_manifests(path: impl AsRef<Path>) -> Result<Vec<Value>, LifecycleError> {
    let yaml = std::fs::read_to_string(path)?;
    parse_manifests(&yaml)
}

/// Copy a manifest template to `output`, substituting `version` for `PG_VERSION`
pub fn write_versioned_manifest(
    template: impl AsRef<Path>,
    output: impl AsRef<Path>,
    version: &str,
) -> Result<(), LifecycleError> {
    let rendered = render_manifest_version(&std::fs::read_to_string(template)?, version);
    std::fs::write(output, rendered)?;
    Ok(())
}

/// `metadata.name` of a manifest
pub fn manifest_name(manifest: &Value) -> Result<String, LifecycleError> {
    manifest
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LifecycleError::Malformed("manifest has no metadata.name".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKUP: &str = r#"
apiVersion: postgresql.cnpg.io/v1
kind: Backup
metadata:
  name: automatic-test-backup
spec:
  cluster:
    name: cluster-example
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(BACKUP).unwrap();
        assert_eq!(manifest["kind"], "Backup");
        assert_eq!(manifest_name(&manifest).unwrap(), "automatic-test-backup");
    }

    #[test]
    fn test_rejects_non_mapping() {
        assert!(matches!(parse_manifest("- a\n- b\n"), Err(LifecycleError::Malformed(_))));
        assert!(matches!(parse_manifest("kind: [unclosed"), Err(LifecycleError::Yaml(_))));
    }

    #[test]
    fn test_parse_multi_document_manifest() {
        let yaml = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: hammerdb-config
data:
  warehouses: "4"
---
apiVersion: batch/v1
kind: Job
metadata:
  name: j-runtprocc
---
"#;
        let documents = parse_manifests(yaml).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["kind"], "ConfigMap");
        assert_eq!(manifest_name(&documents[1]).unwrap(), "j-runtprocc");

        assert!(parse_manifest(yaml).is_err());
        assert!(matches!(parse_manifests("kind: Job\n---\n- a\n"), Err(LifecycleError::Malformed(_))));
    }

    #[test]
    fn test_manifest_without_name() {
        let manifest = parse_manifest("kind: Cluster\nmetadata: {}\n").unwrap();
        assert!(matches!(manifest_name(&manifest), Err(LifecycleError::Malformed(_))));
    }

    #[test]
    fn test_write_versioned_manifest() {
        let dir = std::env::temp_dir().join(format!("cnpg-lifecycle-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let template = dir.join("cluster.yaml");
        let output = dir.join("cluster-16.2.yaml");
        std::fs::write(&template, "spec:\n  imageName: ghcr.io/cloudnative-pg/postgresql:PG_VERSION\n").unwrap();

        write_versioned_manifest(&template, &output, "16.2").unwrap();

        let manifest = load_manifest(&output).unwrap();
        assert_eq!(manifest["spec"]["imageName"], "ghcr.io/cloudnative-pg/postgresql:16.2");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
