//! Data Transfer Objects for API requests and responses
//!
//! Amounts travel as decimal strings in smallest units; addresses as 0x-hex.

use carbon::{
    AssetQuote, CertificateRequest, Destination, FeeSchedule, LedgerSnapshot, Payment,
    QuoteRequest, SettlementEvent, SettlementOutcome, SettlementRequest,
};
use discarbon_core::{AssetInfo, CarbonConfig, Network};
use serde::{Deserialize, Serialize};

use crate::state::{parse_address, parse_amount, parse_donation, RequestError};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: String,
    pub chain_id: u64,
}

impl HealthResponse {
    pub fn ok(network: Network) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            network: network.to_string(),
            chain_id: network.chain_id(),
        }
    }
}

/// One entry of the asset allow-list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetResponse {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

impl From<&AssetInfo> for AssetResponse {
    fn from(asset: &AssetInfo) -> Self {
        Self {
            symbol: asset.symbol.clone(),
            address: asset.address.to_string(),
            decimals: asset.decimals,
        }
    }
}

/// Allow-list, the fixed endpoints of every settlement and the pool's fee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsResponse {
    pub carbon_token: String,
    pub native_wrapper: String,
    pub donation_address: String,
    pub redemption_fee_rate: String,
    pub redemption_fee_divider: String,
    pub assets: Vec<AssetResponse>,
}

impl AssetsResponse {
    pub fn new(config: &CarbonConfig, schedule: FeeSchedule) -> Self {
        Self {
            carbon_token: config.carbon_token.to_string(),
            native_wrapper: config.native_wrapper.to_string(),
            donation_address: config.donation_address.to_string(),
            redemption_fee_rate: schedule.fee_rate_in_base.to_string(),
            redemption_fee_divider: schedule.fee_divider.to_string(),
            assets: config.supported_assets.iter().map(AssetResponse::from).collect(),
        }
    }
}

/// POST /quote body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequestDto {
    /// Asset address, or the native coin sentinel
    pub input_asset: String,
    pub desired_output: String,
    #[serde(default)]
    pub donation_percentage: u64,
    #[serde(default)]
    pub fees_included: bool,
}

impl QuoteRequestDto {
    pub fn parse(&self) -> Result<QuoteRequest, RequestError> {
        Ok(QuoteRequest {
            input_asset: parse_address("input_asset", &self.input_asset)?,
            desired_output: parse_amount("desired_output", &self.desired_output)?,
            donation_percentage: parse_donation(self.donation_percentage)?,
            fees_included: self.fees_included,
        })
    }
}

/// Quote response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub input_asset: String,
    pub output_asset: String,
    pub desired_output: String,
    pub donation_amount: String,
    pub redemption_fee: String,
    pub swap_output: String,
    pub required_input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl From<AssetQuote> for QuoteResponse {
    fn from(quote: AssetQuote) -> Self {
        Self {
            input_asset: quote.input_asset.to_string(),
            output_asset: quote.output_asset.to_string(),
            desired_output: quote.desired_output.to_string(),
            donation_amount: quote.donation_amount.to_string(),
            redemption_fee: quote.redemption_fee.to_string(),
            swap_output: quote.swap_output.to_string(),
            required_input: quote.required_input.to_string(),
            path: quote
                .path
                .map(|hops| hops.iter().map(|a| a.to_string()).collect()),
        }
    }
}

/// Payment part of a settlement body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentDto {
    Native { value: String },
    Token { asset: String, amount: String },
}

/// POST /settle body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleRequestDto {
    pub contributor: String,
    pub payment: PaymentDto,
    pub desired_output: String,
    #[serde(default)]
    pub donation_percentage: u64,
    pub destination: Destination,
    #[serde(default)]
    pub certificate: Option<CertificateRequest>,
}

impl SettleRequestDto {
    pub fn parse(&self) -> Result<SettlementRequest, RequestError> {
        let payment = match &self.payment {
            PaymentDto::Native { value } => Payment::Native {
                value: parse_amount("payment.value", value)?,
            },
            PaymentDto::Token { asset, amount } => Payment::Token {
                asset: parse_address("payment.asset", asset)?,
                amount: parse_amount("payment.amount", amount)?,
            },
        };
        Ok(SettlementRequest {
            contributor: parse_address("contributor", &self.contributor)?,
            payment,
            desired_output: parse_amount("desired_output", &self.desired_output)?,
            donation_percentage: parse_donation(self.donation_percentage)?,
            destination: self.destination,
            certificate: self.certificate.clone(),
        })
    }
}

/// Flattened settlement event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<u64>,
    pub amount: String,
}

impl From<&SettlementEvent> for EventResponse {
    fn from(event: &SettlementEvent) -> Self {
        match event {
            SettlementEvent::ContributionSent {
                asset_label,
                amount,
            } => Self {
                event: "ContributionSent".to_string(),
                asset_label: Some(asset_label.clone()),
                beneficiary: None,
                token_id: None,
                amount: amount.to_string(),
            },
            SettlementEvent::CarbonRetired {
                asset_label,
                amount,
            } => Self {
                event: "CarbonRetired".to_string(),
                asset_label: Some(asset_label.clone()),
                beneficiary: None,
                token_id: None,
                amount: amount.to_string(),
            },
            SettlementEvent::CertificateIssued {
                beneficiary,
                token_id,
                amount,
            } => Self {
                event: "CertificateIssued".to_string(),
                asset_label: None,
                beneficiary: Some(beneficiary.to_string()),
                token_id: Some(*token_id),
                amount: amount.to_string(),
            },
        }
    }
}

/// Settlement response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleResponse {
    pub contributor: String,
    pub asset_label: String,
    pub input_asset: String,
    pub input_spent: String,
    pub refunded: String,
    pub carbon_amount: String,
    pub donation_amount: String,
    pub redemption_fee: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<u64>,
    pub events: Vec<EventResponse>,
}

impl From<SettlementOutcome> for SettleResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            contributor: outcome.contributor.to_string(),
            asset_label: outcome.asset_label,
            input_asset: outcome.input_asset.to_string(),
            input_spent: outcome.input_spent.to_string(),
            refunded: outcome.refunded.to_string(),
            carbon_amount: outcome.carbon_amount.to_string(),
            donation_amount: outcome.donation_amount.to_string(),
            redemption_fee: outcome.redemption_fee.to_string(),
            destination: outcome.destination.to_string(),
            certificate_id: outcome.certificate_id,
            events: outcome.events.iter().map(EventResponse::from).collect(),
        }
    }
}

/// Cumulative amount of one contributor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionResponse {
    pub address: String,
    pub amount: String,
}

/// Ledger total plus contributors in first-contribution order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerResponse {
    pub total: String,
    pub contributors: Vec<ContributionResponse>,
}

impl From<LedgerSnapshot> for LedgerResponse {
    fn from(snapshot: LedgerSnapshot) -> Self {
        Self {
            total: snapshot.total.to_string(),
            contributors: snapshot
                .contributors
                .into_iter()
                .map(|(address, amount)| ContributionResponse {
                    address: address.to_string(),
                    amount: amount.to_string(),
                })
                .collect(),
        }
    }
}

/// Contributor at a ledger position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorResponse {
    pub index: usize,
    pub address: String,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        Self::new(e.error_code(), e.to_string())
    }
}
