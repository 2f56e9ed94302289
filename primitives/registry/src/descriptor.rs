//! Model descriptors and the paths derived from them.
//!
//! A [`ModelDescriptor`] names one upstream API model. Everything the
//! pipeline touches for that model (spec URL, local raw file, converted
//! file, generated client) is computed here so the rest of the workspace
//! never builds those paths by string manipulation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::RegistryError;

/// A static record naming one API specification to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// File name of the spec as published upstream (e.g. `feeds_2021-06-30.json`).
    pub source_file_name: String,
    /// Path segment appended to the source base URL.
    pub remote_path: String,
    /// Destination directory for generated bindings (e.g. `internal/amazon/feeds`).
    pub output_folder: String,
}

/// Every on-disk location associated with one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Downloaded spec, byte-for-byte as served upstream.
    pub raw_spec: PathBuf,
    /// Converted (YAML) spec handed to the generator.
    pub converted_spec: PathBuf,
    /// Directory receiving the generated client.
    pub output_dir: PathBuf,
    /// Generated client source file.
    pub output_file: PathBuf,
}

impl ModelDescriptor {
    /// Build a descriptor from borrowed parts.
    pub fn new(
        source_file_name: impl Into<String>,
        remote_path: impl Into<String>,
        output_folder: impl Into<String>,
    ) -> Self {
        Self {
            source_file_name: source_file_name.into(),
            remote_path: remote_path.into(),
            output_folder: output_folder.into(),
        }
    }

    /// The generator package name: the last `/`-separated segment of `output_folder`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPackageName`] if the segment is empty,
    /// contains a path separator, or is not a valid identifier.
    pub fn package_name(&self) -> Result<&str, RegistryError> {
        let segment = self.output_folder.rsplit('/').next().unwrap_or_default();
        if is_valid_package_name(segment) {
            Ok(segment)
        } else {
            Err(RegistryError::InvalidPackageName {
                output_folder: self.output_folder.clone(),
                segment: segment.to_string(),
            })
        }
    }

    /// Full URL of the upstream spec under `base_url`.
    pub fn spec_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.remote_path.trim_start_matches('/')
        )
    }

    /// Resolve every path for this model.
    ///
    /// The raw file lives at `{models_dir}/{prefix}{source_file_name}`; the
    /// converted file is its sibling with a `yaml` extension.
    pub fn paths(&self, models_dir: &Path, prefix: &str, output_file: &str) -> ModelPaths {
        let raw_spec = models_dir.join(format!("{}{}", prefix, self.source_file_name));
        let converted_spec = raw_spec.with_extension("yaml");
        let output_dir = PathBuf::from(&self.output_folder);
        let output_file = output_dir.join(output_file);
        ModelPaths { raw_spec, converted_spec, output_dir, output_file }
    }

    /// Check that every field is populated and the package name is usable.
    pub(crate) fn validate(&self) -> Result<(), RegistryError> {
        for (field, value) in [
            ("source_file_name", &self.source_file_name),
            ("remote_path", &self.remote_path),
            ("output_folder", &self.output_folder),
        ] {
            if value.trim().is_empty() {
                return Err(RegistryError::EmptyField {
                    field,
                    model: self.source_file_name.clone(),
                });
            }
        }
        self.package_name().map(|_| ())
    }
}

/// Package names must be non-empty identifiers: ASCII letters, digits and
/// underscores, not starting with a digit. This also rules out `/` and `\`.
fn is_valid_package_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
