//! The phone catalog: a static, read-only list loaded once at startup and
//! embedded verbatim into every prompt.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

const EMBEDDED_CATALOG: &str = include_str!("../data/phones.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not a valid list of phones: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One phone. Fields beyond name/brand/price are free-form and kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub price: u64,
    #[serde(flatten)]
    pub specs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    phones: Vec<Phone>,
    serialized: String,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let phones: Vec<Phone> = serde_json::from_str(raw)?;
        let serialized = serde_json::to_string(&phones)?;
        Ok(Self { phones, serialized })
    }

    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Loads `path` when given, otherwise the embedded catalog.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let catalog = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::embedded()?,
        };
        info!(phones = catalog.len(), source = ?path, "Catalog loaded");
        Ok(catalog)
    }

    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    pub fn len(&self) -> usize {
        self.phones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phones.is_empty()
    }

    /// Compact JSON form, as placed in prompts.
    pub fn as_prompt_json(&self) -> &str {
        &self.serialized
    }
}
