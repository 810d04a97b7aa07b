//! Application errors.

use colorama_core::engine::EngineError;
use colorama_core::storage::StorageError;
use colorama_export::ExportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

pub type AppResult<T> = Result<T, AppError>;
