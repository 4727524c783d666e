//! Core type definitions for disCarbon

use alloy_primitives::address;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use alloy_primitives::{Address, U256};

/// Sentinel address standing in for the chain's native coin (MATIC on Polygon).
///
/// Native coin has no contract address; balances and transfers of it are keyed
/// by this placeholder wherever an asset address is expected.
pub const NATIVE_COIN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Polygon PoS mainnet
    Mainnet,
    /// Polygon Mumbai testnet
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "polygon",
            Self::Testnet => "mumbai",
        }
    }

    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Mainnet => 137,
            Self::Testnet => 80_001,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fungible asset accepted as settlement input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    /// Ticker, e.g. "USDC"
    pub symbol: String,
    /// ERC-20 contract address
    pub address: Address,
    /// Decimal places of the smallest unit
    pub decimals: u8,
}

impl AssetInfo {
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
        }
    }
}

impl fmt::Display for AssetInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

/// Constants
pub mod constants {
    use alloy_primitives::{address, Address};

    /// Denominator for donation percentages
    pub const PERCENT_DENOM: u64 = 100;

    /// Upper bound for a donation percentage
    pub const MAX_DONATION_PERCENTAGE: u8 = 100;

    /// Toucan Nature Carbon Tonne (NCT) pool token
    pub const NCT: Address = address!("D838290e877E0188a4A44700463419ED96c16107");

    /// Wrapped MATIC
    pub const WMATIC: Address = address!("0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270");

    /// USDC (PoS bridged, 6 decimals)
    pub const USDC: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

    /// DAI
    pub const DAI: Address = address!("8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063");

    /// Wrapped Ether
    pub const WETH: Address = address!("7ceB23fD6bC0adD59E62ac25578270cFf1b9f619");

    /// disCarbon multisig receiving donations
    pub const DONATION_ADDRESS: Address = address!("CFA521D5514dDf8334f3907dcFe99752D51580E9");
}
