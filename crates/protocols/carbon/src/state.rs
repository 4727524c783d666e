//! Carbon State Types
//!
//! Data structures for quotes, settlements, events and errors.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::interfaces::{RedemptionError, RouterError, TokenError};
use crate::ledger::LedgerError;

/// Redemption fee parameters reported by the carbon pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fee numerator, e.g. 1000
    pub fee_rate_in_base: U256,
    /// Fee divider, e.g. 10000
    pub fee_divider: U256,
}

/// Parameters of `calculate_needed_amount`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Allow-listed asset the caller pays with
    pub input_asset: Address,
    /// Carbon the caller wants pooled, forwarded or retired
    pub desired_output: U256,
    /// Donation on top of the desired output, 0..=100
    #[serde(default)]
    pub donation_percentage: u8,
    /// Add the pool's redemption fee to the amount being bought
    #[serde(default)]
    pub fees_included: bool,
}

/// Input required for a desired carbon output at current prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub input_asset: Address,
    pub output_asset: Address,
    /// Carbon credited to the contributor
    pub desired_output: U256,
    /// Carbon routed to the donation address
    pub donation_amount: U256,
    /// Carbon consumed by the redemption fee
    pub redemption_fee: U256,
    /// Total carbon to acquire (desired + donation + fee)
    pub swap_output: U256,
    /// Input asset needed to acquire `swap_output`
    pub required_input: U256,
    /// Router path, `None` when input and output are the same asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Address>>,
}

impl AssetQuote {
    /// True when no swap is needed
    pub fn is_direct(&self) -> bool {
        self.path.is_none()
    }
}

/// How the contributor pays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payment {
    /// Native coin sent along with the call; any excess is refunded
    Native { value: U256 },
    /// ERC-20 pulled with `transferFrom` up to the approved amount
    Token { asset: Address, amount: U256 },
}

impl Payment {
    /// Amount the contributor puts up
    pub fn supplied(&self) -> U256 {
        match self {
            Self::Native { value } => *value,
            Self::Token { amount, .. } => *amount,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }
}

/// Where the settled carbon goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    /// Kept by the desk's custody account
    Pool,
    /// Sent on to another address
    Forward { to: Address },
    /// Redeemed and burned
    Retire,
}

impl Destination {
    pub fn is_retirement(&self) -> bool {
        matches!(self, Self::Retire)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Forward { .. } => "forward",
            Self::Retire => "retire",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward { to } => write!(f, "forward to {}", to),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Optional retirement certificate requested with a settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    pub beneficiary: Address,
    pub beneficiary_label: String,
    pub message: String,
}

/// Certificate handed to the minting collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMint {
    pub beneficiary: Address,
    pub beneficiary_label: String,
    pub message: String,
    pub retired_amount: U256,
}

/// A settlement as submitted by a contributor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub contributor: Address,
    pub payment: Payment,
    pub desired_output: U256,
    #[serde(default)]
    pub donation_percentage: u8,
    pub destination: Destination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateRequest>,
}

/// Records emitted by a completed settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum SettlementEvent {
    /// Carbon pooled or forwarded
    ContributionSent { asset_label: String, amount: U256 },
    /// Carbon redeemed and burned
    CarbonRetired { asset_label: String, amount: U256 },
    /// Retirement certificate minted
    CertificateIssued {
        beneficiary: Address,
        token_id: u64,
        amount: U256,
    },
}

/// Progress of a settlement through its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SettlementStage {
    Quoted,
    Supplied,
    Verified,
    Swapped,
    Split,
    Recorded,
    Emitted,
}

/// Result of a completed settlement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub contributor: Address,
    pub asset_label: String,
    pub input_asset: Address,
    /// Input actually consumed by the swap (or transferred directly)
    pub input_spent: U256,
    /// Excess input returned to the contributor
    pub refunded: U256,
    /// Carbon credited in the ledger
    pub carbon_amount: U256,
    pub donation_amount: U256,
    pub redemption_fee: U256,
    pub destination: Destination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<u64>,
    pub events: Vec<SettlementEvent>,
}

/// Carbon protocol errors
#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("Unsupported asset: {asset}")]
    UnsupportedAsset { asset: Address },

    #[error("Not enough {label} to swap to required carbon Token")]
    InsufficientInput {
        label: String,
        required: U256,
        supplied: U256,
    },

    #[error("Donation percentage {percentage} exceeds 100")]
    InvalidDonation { percentage: u8 },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid certificate: {reason}")]
    InvalidCertificate { reason: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: &'static str },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Router error: {0}")]
    Router(#[from] RouterError),

    #[error("Redemption error: {0}")]
    Redemption(#[from] RedemptionError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl CarbonError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedAsset { .. } => "unsupported_asset",
            Self::InsufficientInput { .. } => "insufficient_input",
            Self::InvalidDonation { .. } => "invalid_donation",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidCertificate { .. } => "invalid_certificate",
            Self::Overflow { .. } => "overflow",
            Self::Token(TokenError::InsufficientAllowance { .. }) => "insufficient_allowance",
            Self::Token(TokenError::InsufficientBalance { .. }) => "insufficient_balance",
            Self::Token(_) => "token_error",
            Self::Router(_) => "router_error",
            Self::Redemption(_) => "redemption_error",
            Self::Ledger(_) => "ledger_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedAsset { .. }
            | Self::InvalidDonation { .. }
            | Self::InvalidAmount { .. }
            | Self::InvalidCertificate { .. } => 400,
            Self::InsufficientInput { .. } | Self::Token(_) => 422,
            Self::Overflow { .. } | Self::Ledger(_) => 422,
            Self::Router(_) | Self::Redemption(_) => 502,
        }
    }
}
