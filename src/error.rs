use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::core::{CatalogError, ConfigError};
use crate::settings::SettingsError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Settings(#[from] SettingsError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("rule set error: {0}")]
    Rules(#[from] ConfigError),
    #[error("unable to read rule set {path}: {source}")]
    RulesRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0}")]
    Request(#[from] RequestError),
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller mistakes in a match or listing request.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("invalid request: {0}")]
    Malformed(String),
    #[error("maxResults must be between 1 and {limit}, got {value}")]
    MaxResults { value: usize, limit: usize },
    #[error("monthlyContribution must be a finite amount >= 0")]
    MonthlyContribution,
    #[error("unknown product id '{0}'")]
    UnknownProduct(String),
    #[error("give either category or productId, not both")]
    AmbiguousSubject,
    #[error("unknown sort key '{0}'")]
    UnknownSortKey(String),
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::UnknownProduct(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Request(err) => err.status(),
            other => {
                error!(error = %other, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        crate::api::error_response(status, &self.to_string())
    }
}
