use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::{Catalog, MatchConfig, MatchEngine};
use crate::error::AppError;

/// Catalog and rule set shared read-only by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: MatchEngine,
    pub catalog: Catalog,
}

impl AppState {
    pub fn new(engine: MatchEngine, catalog: Catalog) -> Self {
        Self { engine, catalog }
    }

    /// Falls back to the embedded catalog and the built-in rule set.
    pub fn load(catalog_path: Option<&Path>, rules_path: Option<&Path>) -> Result<Self, AppError> {
        let catalog = match catalog_path {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::embedded()?,
        };
        let config = match rules_path {
            Some(path) => {
                let json = fs::read_to_string(path).map_err(|source| AppError::RulesRead {
                    path: path.to_path_buf(),
                    source,
                })?;
                MatchConfig::from_json_str(&json)?
            }
            None => MatchConfig::default(),
        };
        let engine = MatchEngine::new(config)?;
        info!(
            products = catalog.len(),
            custom_rules = rules_path.is_some(),
            "match engine ready"
        );
        Ok(Self::new(engine, catalog))
    }
}
