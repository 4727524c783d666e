//! Configuration types for disCarbon

use std::collections::HashSet;
use std::path::Path;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::constants::{DAI, DONATION_ADDRESS, NCT, USDC, WETH, WMATIC};
use crate::{AssetInfo, ConfigError, Network};

/// Carbon settlement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonConfig {
    /// Carbon pool token every settlement ends in (NCT)
    pub carbon_token: Address,

    /// ERC-20 wrapper of the native coin, used to price native payments
    pub native_wrapper: Address,

    /// Intermediate token for multi-hop routes
    pub hub_token: Address,

    /// Allow-list of settlement inputs
    pub supported_assets: Vec<AssetInfo>,

    /// Receiver of the donation share
    pub donation_address: Address,

    /// Event label for native coin payments
    pub native_label: String,

    /// Event label for ERC-20 payments
    pub token_label: String,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            carbon_token: NCT,
            native_wrapper: WMATIC,
            hub_token: USDC,
            supported_assets: vec![
                AssetInfo::new("NCT", NCT, 18),
                AssetInfo::new("WMATIC", WMATIC, 18),
                AssetInfo::new("USDC", USDC, 6),
                AssetInfo::new("DAI", DAI, 18),
                AssetInfo::new("WETH", WETH, 18),
            ],
            donation_address: DONATION_ADDRESS,
            native_label: "Matic".to_string(),
            token_label: "Token".to_string(),
        }
    }
}

impl CarbonConfig {
    /// Look up an allow-listed asset by address
    pub fn asset(&self, address: Address) -> Option<&AssetInfo> {
        self.supported_assets.iter().find(|a| a.address == address)
    }

    pub fn is_supported(&self, address: Address) -> bool {
        self.asset(address).is_some()
    }

    /// Check internal consistency of the settlement parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.carbon_token == Address::ZERO {
            return Err(ConfigError::ZeroAddress {
                field: "carbon_token",
            });
        }
        if self.donation_address == Address::ZERO {
            return Err(ConfigError::ZeroAddress {
                field: "donation_address",
            });
        }

        let mut seen = HashSet::new();
        for asset in &self.supported_assets {
            if !seen.insert(asset.address) {
                return Err(ConfigError::DuplicateAsset {
                    address: asset.address.to_string(),
                });
            }
        }

        if !self.is_supported(self.carbon_token) {
            return Err(ConfigError::MissingAsset {
                symbol: "carbon_token",
            });
        }
        if !self.is_supported(self.native_wrapper) {
            return Err(ConfigError::MissingAsset {
                symbol: "native_wrapper",
            });
        }
        if !self.is_supported(self.hub_token) {
            return Err(ConfigError::MissingAsset { symbol: "hub_token" });
        }
        if self.native_wrapper == self.carbon_token {
            return Err(ConfigError::WrapperIsCarbon);
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network (mainnet or testnet)
    pub network: Network,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Settlement parameters
    #[serde(default)]
    pub carbon: CarbonConfig,
}

fn default_api_port() -> u16 {
    18137
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            api_port: default_api_port(),
            carbon: CarbonConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.carbon.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            network = %config.network,
            assets = config.carbon.supported_assets.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}
