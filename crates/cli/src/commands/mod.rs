//! CLI command implementations.

pub mod checkout;
pub mod products;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Storefront(#[from] pupusas_storefront::AppError),
}

impl From<pupusas_storefront::ContentError> for CommandError {
    fn from(e: pupusas_storefront::ContentError) -> Self {
        Self::Storefront(e.into())
    }
}

impl From<pupusas_core::CartError> for CommandError {
    fn from(e: pupusas_core::CartError) -> Self {
        Self::Storefront(e.into())
    }
}

/// Read and decode a JSON file.
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| CommandError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
