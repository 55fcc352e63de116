use thiserror::Error;

use crate::geometry::ConfigurationWarning;

pub type Result<T> = std::result::Result<T, ComposeError>;

#[derive(Debug, Error)]
pub enum ComposeError {
    /// Input was empty after trimming.
    #[error("nothing to encode: input is empty")]
    EmptyInput,

    #[error("failed to encode QR code: {0}")]
    Encode(String),

    #[error("failed to decode QR code: {0}")]
    Decode(String),

    #[error("failed to read logo from {source_name}: {reason}")]
    AssetRead { source_name: String, reason: String },

    #[error("rasterization failed: {0}")]
    Rasterization(String),

    #[error("logo-in-cutout needs a logo to be loaded first")]
    InvalidState,

    #[error("logo-in-cutout is unavailable: {0}")]
    DegenerateGeometry(ConfigurationWarning),

    #[error("export size must be between 1 and 8192 pixels")]
    InvalidExportSize,

    #[error("no QR code has been generated yet")]
    NoPayload,
}

impl ComposeError {
    pub(crate) fn asset(source_name: impl Into<String>, reason: impl ToString) -> Self {
        ComposeError::AssetRead {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn raster(reason: impl ToString) -> Self {
        ComposeError::Rasterization(reason.to_string())
    }
}
