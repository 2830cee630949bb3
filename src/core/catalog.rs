use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::types::Product;

const DEFAULT_CATALOG_JSON: &str = include_str!("../../data/catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unable to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog entry #{index} has an empty id")]
    EmptyId { index: usize },
    #[error("catalog entry #{index} has whitespace around its id '{id}'")]
    PaddedId { index: usize, id: String },
    #[error("duplicate product id '{0}' in catalog")]
    DuplicateId(String),
}

/// Immutable product sequence, loaded once before first use.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for (index, product) in products.iter().enumerate() {
            let id = product.id.as_str();
            if id.trim().is_empty() {
                return Err(CatalogError::EmptyId { index });
            }
            if id.trim() != id {
                return Err(CatalogError::PaddedId {
                    index,
                    id: id.to_string(),
                });
            }
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateId(id.to_string()));
            }
        }
        Ok(Self { products })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(path = %path.display(), products = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// The catalog bundled with the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_str(DEFAULT_CATALOG_JSON)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Surrounding whitespace in `id` is ignored.
    pub fn get(&self, id: &str) -> Option<&Product> {
        let id = id.trim();
        self.products.iter().find(|product| product.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
