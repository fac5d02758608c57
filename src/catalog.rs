//! Static model catalog.
//!
//! The set of models the mock advertises is read once at startup from a JSON
//! document (an array of model objects, each with a unique `id`) and never
//! mutated afterwards, so handlers can share it without locking.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One advertised model.
///
/// Only `id` and the `object` tag are interpreted; any further metadata in
/// the catalog file (`created`, `owned_by`, ...) is carried through verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    #[serde(default = "model_object_tag")]
    pub object: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn model_object_tag() -> String {
    "model".to_string()
}

/// Immutable id → descriptor registry, built once before the server binds.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    index: HashMap<String, usize>,
}

impl ModelCatalog {
    /// Load the catalog from a JSON file. Any failure here is fatal to
    /// startup; there is no fallback catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Parse a catalog from raw JSON (an array of model objects).
    pub fn from_json(data: &str) -> Result<Self, CatalogError> {
        let models: Vec<ModelDescriptor> = serde_json::from_str(data)?;

        // Last occurrence wins on duplicate ids; the list keeps all entries
        // in source order.
        let index = models
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();

        Ok(Self { models, index })
    }

    /// All models, in catalog-source order.
    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Look up a model by id.
    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.index.get(id).map(|&i| &self.models[i])
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
