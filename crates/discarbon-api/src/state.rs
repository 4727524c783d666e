//! Application state shared across API handlers

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use carbon::SettlementExecutor;
use discarbon_core::{AppConfig, Network};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

/// Errors turning request fields into protocol values
#[derive(Debug, Error)]
pub enum RequestError {
    /// Not a 20-byte hex address
    #[error("Invalid address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    /// Not a decimal (or 0x-hex) unsigned 256-bit integer
    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: &'static str, value: String },

    /// Donation percentage outside 0..=100
    #[error("Donation percentage must be between 0 and 100, got {value}")]
    InvalidDonation { value: u64 },
}

impl RequestError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "invalid_address",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidDonation { .. } => "invalid_donation",
        }
    }
}

/// Parse a hex address from a request field.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address, RequestError> {
    Address::from_str(value.trim()).map_err(|_| RequestError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

/// Narrow a donation percentage from a request body. Values up to 255 pass
/// through; the protocol rejects anything over 100 itself.
pub fn parse_donation(value: u64) -> Result<u8, RequestError> {
    u8::try_from(value).map_err(|_| RequestError::InvalidDonation { value })
}

/// Parse an amount in smallest units from a request field.
pub fn parse_amount(field: &'static str, value: &str) -> Result<U256, RequestError> {
    U256::from_str(value.trim()).map_err(|_| RequestError::InvalidAmount {
        field,
        value: value.to_string(),
    })
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    /// Settlements and ledger reads are serialized through this lock.
    executor: Mutex<SettlementExecutor>,
}

impl AppState {
    /// The executor's carbon config replaces `config.carbon`, so every
    /// route reports the allow-list the executor actually enforces.
    pub fn new(mut config: AppConfig, executor: SettlementExecutor) -> Self {
        config.carbon = executor.config().clone();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                executor: Mutex::new(executor),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn network(&self) -> Network {
        self.inner.config.network
    }

    /// Lock the executor for one operation
    pub async fn executor(&self) -> MutexGuard<'_, SettlementExecutor> {
        self.inner.executor.lock().await
    }
}
