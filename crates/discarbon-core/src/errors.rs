//! Configuration errors for disCarbon

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Asset {symbol} must be in the supported asset list")]
    MissingAsset { symbol: &'static str },

    #[error("Duplicate asset in supported list: {address}")]
    DuplicateAsset { address: String },

    #[error("Address for {field} must not be zero")]
    ZeroAddress { field: &'static str },

    #[error("Native wrapper must differ from the carbon token")]
    WrapperIsCarbon,
}

impl ConfigError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "config_io",
            Self::Parse(_) => "config_parse",
            Self::MissingAsset { .. } => "config_missing_asset",
            Self::DuplicateAsset { .. } => "config_duplicate_asset",
            Self::ZeroAddress { .. } => "config_zero_address",
            Self::WrapperIsCarbon => "config_wrapper_is_carbon",
        }
    }
}
