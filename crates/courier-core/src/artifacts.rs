//! Named artifact lookup for rule sets and canned responses
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! An artifact named `acme.users.lookup.get.v2` is searched as
//! `<dir>/acme.users.lookup.get.v2.{json,yaml,yml}` in every external
//! directory, then in the legacy directory. Exactly one match is required.

use crate::error::ArtifactError;
use crate::types::ArtifactPaths;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Result type for artifact operations
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Supported artifact file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML format (.yaml, .yml)
    Yaml,
    /// JSON format (.json)
    Json,
}

impl Format {
    /// Every recognized extension, in lookup order
    pub const EXTENSIONS: [(&'static str, Format); 3] = [
        ("json", Format::Json),
        ("yaml", Format::Yaml),
        ("yml", Format::Yaml),
    ];

    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        Self::EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, format)| *format)
    }
}

/// Loads artifacts by name from a set of directories
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    paths: ArtifactPaths,
}

impl ArtifactLoader {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    /// Locate and parse an artifact
    pub fn load(&self, name: &str) -> ArtifactResult<Value> {
        let path = self.locate(name)?;
        parse_file(&path)
    }

    /// Resolve the single file backing `name`
    pub fn locate(&self, name: &str) -> ArtifactResult<PathBuf> {
        let external: Vec<PathBuf> = self
            .paths
            .external
            .iter()
            .flat_map(|dir| candidates(dir, name))
            .collect();

        let mut found = match external.len() {
            0 => self
                .paths
                .legacy
                .as_deref()
                .map(|dir| candidates(dir, name))
                .unwrap_or_default(),
            _ => external,
        };

        match found.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_string(),
                searched: self.searched(),
            }),
            1 => Ok(found.remove(0)),
            _ => Err(ArtifactError::Duplicate {
                name: name.to_string(),
                paths: found,
            }),
        }
    }

    fn searched(&self) -> String {
        let mut dirs: Vec<String> = self
            .paths
            .external
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        if let Some(legacy) = &self.paths.legacy {
            dirs.push(legacy.display().to_string());
        }
        if dirs.is_empty() {
            "<no directories configured>".to_string()
        } else {
            dirs.join(", ")
        }
    }
}

/// Existing files in `dir` that answer to `name`
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    Format::EXTENSIONS
        .iter()
        .map(|(ext, _)| dir.join(format!("{}.{}", name, ext)))
        .filter(|path| path.is_file())
        .collect()
}

/// Parse an artifact file, detecting format from its extension
pub fn parse_file(path: &Path) -> ArtifactResult<Value> {
    let format = Format::from_path(path).ok_or_else(|| ArtifactError::Parse {
        path: path.to_path_buf(),
        reason: "unsupported file extension".to_string(),
    })?;
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_content(&content, format, path)
}

/// Parse artifact content with an explicit format
pub fn parse_content(content: &str, format: Format, path: &Path) -> ArtifactResult<Value> {
    let parse_error = |reason: String| ArtifactError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    match format {
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Yaml => {
            // Go through serde_yaml::Value to surface YAML-specific errors first
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
            serde_json::to_value(yaml).map_err(|e| parse_error(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    fn loader(external: &[&TempDir], legacy: Option<&TempDir>) -> ArtifactLoader {
        ArtifactLoader::new(ArtifactPaths {
            external: external.iter().map(|d| d.path().to_path_buf()).collect(),
            legacy: legacy.map(|d| d.path().to_path_buf()),
        })
    }

    #[test]
    fn test_external_takes_precedence_over_legacy() {
        let external = TempDir::new().unwrap();
        let legacy = TempDir::new().unwrap();
        write(external.path(), "op.json", r#"{"from": "external"}"#);
        write(legacy.path(), "op.json", r#"{"from": "legacy"}"#);

        let value = loader(&[&external], Some(&legacy)).load("op").unwrap();
        assert_eq!(value, json!({"from": "external"}));
    }

    #[test]
    fn test_legacy_fallback_and_yaml() {
        let external = TempDir::new().unwrap();
        let legacy = TempDir::new().unwrap();
        write(legacy.path(), "op.yaml", "from: legacy\ncount: 2\n");

        let value = loader(&[&external], Some(&legacy)).load("op").unwrap();
        assert_eq!(value, json!({"from": "legacy", "count": 2}));
    }

    #[test]
    fn test_duplicate_across_external_directories() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "op.json", "{}");
        write(b.path(), "op.json", "{}");

        let err = loader(&[&a, &b], None).load("op").unwrap_err();
        assert!(matches!(err, ArtifactError::Duplicate { ref paths, .. } if paths.len() == 2));
    }

    #[test]
    fn test_duplicate_extensions_in_one_directory() {
        let a = TempDir::new().unwrap();
        write(a.path(), "op.json", "{}");
        write(a.path(), "op.yml", "{}");

        let err = loader(&[&a], None).load("op").unwrap_err();
        assert!(matches!(err, ArtifactError::Duplicate { .. }));
    }

    #[test]
    fn test_not_found_lists_searched_directories() {
        let a = TempDir::new().unwrap();
        let err = loader(&[&a], None).load("missing").unwrap_err();
        match err {
            ArtifactError::NotFound { name, searched } => {
                assert_eq!(name, "missing");
                assert!(searched.contains(&a.path().display().to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_failure() {
        let a = TempDir::new().unwrap();
        write(a.path(), "op.json", "{ not json");
        let err = loader(&[&a], None).load("op").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }
}
