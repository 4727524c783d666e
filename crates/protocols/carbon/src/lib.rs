//! Carbon Settlement Protocol
//!
//! Swaps native coin or allow-listed ERC-20 tokens into the carbon pool token
//! through an external router, then pools, forwards or retires the result
//! while keeping a per-contributor ledger.

pub mod calculator;
pub mod constants;
pub mod estimator;
pub mod executor;
pub mod interfaces;
pub mod ledger;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use calculator::{calculate_input, donation_share, redemption_fee};
pub use estimator::QuoteEstimator;
pub use executor::{Collaborators, SettlementExecutor};
pub use interfaces::{
    CertificateError, CertificateMinter, PriceSource, RedemptionError, RedemptionFacility,
    RouterError, SwapPath, SwapRouter, TokenBank, TokenError,
};
pub use ledger::{ContributionLedger, LedgerError, LedgerSnapshot};
pub use state::{
    AssetQuote, CarbonError, CertificateMint, CertificateRequest, Destination, FeeSchedule,
    Payment, QuoteRequest, SettlementEvent, SettlementOutcome, SettlementRequest,
    SettlementStage,
};
