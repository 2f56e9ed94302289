#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Model Registry: the static table of API models to generate clients for.
//!
//! The registry is built once at start-up (either from the built-in table or
//! from configuration) and is read-only afterwards. Construction validates
//! every descriptor, so downstream code can rely on each one having a usable
//! package name.

pub mod descriptor;

use std::path::{Path, PathBuf};

pub use descriptor::{ModelDescriptor, ModelPaths};
use thiserror::Error;

/// Errors raised while building or querying a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A descriptor field was empty or whitespace.
    #[error("Model '{model}' has an empty `{field}`")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
        /// Source file name of the descriptor (may itself be empty).
        model: String,
    },
    /// The last segment of `output_folder` cannot be used as a package name.
    #[error("Output folder '{output_folder}' yields invalid package name '{segment}'")]
    InvalidPackageName {
        /// The descriptor's output folder.
        output_folder: String,
        /// The extracted last segment.
        segment: String,
    },
    /// Two descriptors share a source file name.
    #[error("Duplicate model '{0}' in registry")]
    Duplicate(String),
    /// A selection named a model that is not registered.
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
}

/// Result alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Upstream spec files, remote paths and output folders of the Selling
/// Partner API models the CLI depends on.
const BUILTIN_MODELS: &[(&str, &str, &str)] = &[
    (
        "fulfillmentInbound_2024-03-20.json",
        "fulfillment-inbound-api-model/fulfillmentInbound_2024-03-20.json",
        "internal/amazon/fba_inbound",
    ),
    ("fbaInventory.json", "fba-inventory-api-model/fbaInventory.json", "internal/amazon/fba_inventory"),
    (
        "catalogItems_2022-04-01.json",
        "catalog-items-api-model/catalogItems_2022-04-01.json",
        "internal/amazon/catalog",
    ),
    (
        "listingsItems_2021-08-01.json",
        "listings-items-api-model/listingsItems_2021-08-01.json",
        "internal/amazon/listings",
    ),
    (
        "definitionsProductTypes_2020-09-01.json",
        "product-type-definitions-api-model/definitionsProductTypes_2020-09-01.json",
        "internal/amazon/product_type_definitions",
    ),
    ("feeds_2021-06-30.json", "feeds-api-model/feeds_2021-06-30.json", "internal/amazon/feeds"),
];

/// An ordered, validated, immutable list of model descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry, validating every descriptor and rejecting duplicates.
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self> {
        for (i, model) in models.iter().enumerate() {
            model.validate()?;
            if models[..i].iter().any(|m| m.source_file_name == model.source_file_name) {
                return Err(RegistryError::Duplicate(model.source_file_name.clone()));
            }
        }
        Ok(Self { models })
    }

    /// The built-in Selling Partner API models.
    pub fn builtin() -> Self { Self { models: builtin_models() } }

    /// Restrict the registry to `names`, keeping registry order.
    ///
    /// An empty selection returns the whole registry.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self.clone());
        }
        if let Some(unknown) = names.iter().find(|n| self.get(n.as_ref()).is_none()) {
            return Err(RegistryError::UnknownModel(unknown.as_ref().to_string()));
        }
        let models = self
            .models
            .iter()
            .filter(|m| names.iter().any(|n| n.as_ref() == m.source_file_name))
            .cloned()
            .collect();
        Ok(Self { models })
    }

    /// Directories the pipeline needs before any network activity:
    /// every output folder in registry order, then `models_dir`.
    pub fn directories(&self, models_dir: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> =
            self.models.iter().map(|m| PathBuf::from(&m.output_folder)).collect();
        dirs.push(models_dir.to_path_buf());
        dirs
    }

    /// Look up a descriptor by its source file name.
    pub fn get(&self, source_file_name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.source_file_name == source_file_name)
    }

    /// Iterate descriptors in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> { self.models.iter() }

    /// Number of descriptors.
    pub fn len(&self) -> usize { self.models.len() }

    /// Whether the registry has no descriptors.
    pub fn is_empty(&self) -> bool { self.models.is_empty() }
}

impl Default for ModelRegistry {
    fn default() -> Self { Self::builtin() }
}

impl<'a> IntoIterator for &'a ModelRegistry {
    type Item = &'a ModelDescriptor;
    type IntoIter = std::slice::Iter<'a, ModelDescriptor>;

    fn into_iter(self) -> Self::IntoIter { self.models.iter() }
}

/// The built-in descriptors as owned values (also the config default).
pub fn builtin_models() -> Vec<ModelDescriptor> {
    BUILTIN_MODELS
        .iter()
        .map(|(file, remote, folder)| ModelDescriptor::new(*file, *remote, *folder))
        .collect()
}
