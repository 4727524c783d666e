//! External collaborator interfaces
//!
//! The settlement core never talks to a chain directly. Token custody, price
//! discovery, swaps, redemption and certificate minting are reached through
//! these traits. Each call either completes or fails with an error; none of
//! them suspend.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{CertificateMint, FeeSchedule};

/// ERC-20 style failures, surfaced unchanged to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("ERC20: insufficient allowance ({allowance} < {needed})")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        allowance: U256,
        needed: U256,
    },

    #[error("ERC20: transfer amount exceeds balance ({balance} < {needed})")]
    InsufficientBalance {
        token: Address,
        owner: Address,
        balance: U256,
        needed: U256,
    },

    #[error("ERC20: transfer to the zero address")]
    ZeroAddress,

    #[error("ERC20: account {account} is frozen")]
    Frozen { token: Address, account: Address },
}

/// Fungible asset transfer facility.
///
/// Native coin is addressed with [`discarbon_core::NATIVE_COIN`].
pub trait TokenBank {
    fn balance_of(&self, token: Address, owner: Address) -> U256;

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256);

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    fn burn(&mut self, token: Address, from: Address, amount: U256) -> Result<(), TokenError>;
}

/// Ordered token path for a multi-hop swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapPath(Vec<Address>);

impl SwapPath {
    /// A path needs at least two tokens and no immediate repeats.
    pub fn new(hops: Vec<Address>) -> Result<Self, RouterError> {
        if hops.len() < 2 || hops.windows(2).any(|w| w[0] == w[1]) {
            return Err(RouterError::InvalidPath);
        }
        Ok(Self(hops))
    }

    pub fn input(&self) -> Address {
        self.0[0]
    }

    pub fn output(&self) -> Address {
        self.0[self.0.len() - 1]
    }

    pub fn hops(&self) -> &[Address] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Address> {
        self.0
    }
}

/// Swap router failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("Invalid swap path")]
    InvalidPath,

    #[error("No pair for {token_in} -> {token_out}")]
    NoPair { token_in: Address, token_out: Address },

    #[error("Insufficient liquidity for swap")]
    InsufficientLiquidity,

    #[error("Excessive input amount: need {required}, max {max_in}")]
    ExcessiveInputAmount { required: U256, max_in: U256 },

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Exact-output price discovery
pub trait PriceSource {
    /// Input needed at the start of `path` to receive `amount_out` at its end.
    fn amount_in(&self, path: &SwapPath, amount_out: U256) -> Result<U256, RouterError>;
}

/// Exact-output swap execution
pub trait SwapRouter: PriceSource {
    /// Swap at most `max_in` of `pay_with` (from `payer`) for exactly
    /// `amount_out` of the path's output token (to `recipient`).
    ///
    /// `pay_with` is usually `path.input()`; it differs for native coin, which
    /// is priced through its wrapper. Returns the input actually spent.
    #[allow(clippy::too_many_arguments)]
    fn swap_exact_output(
        &mut self,
        bank: &mut dyn TokenBank,
        path: &SwapPath,
        pay_with: Address,
        amount_out: U256,
        max_in: U256,
        payer: Address,
        recipient: Address,
    ) -> Result<U256, RouterError>;
}

/// Carbon pool redemption failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedemptionError {
    #[error("Fee mismatch: expected {expected}, got {provided}")]
    FeeMismatch { expected: U256, provided: U256 },

    #[error("Invalid fee schedule")]
    InvalidFeeSchedule,

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Carbon pool redemption and retirement
pub trait RedemptionFacility {
    fn fee_schedule(&self) -> FeeSchedule;

    /// Redeem `amount + fee` pool tokens held by `holder` into underlying
    /// credits and retire them. Returns the amount retired.
    fn redeem_and_retire(
        &mut self,
        bank: &mut dyn TokenBank,
        holder: Address,
        amount: U256,
        fee: U256,
    ) -> Result<U256, RedemptionError>;
}

/// Certificate minting failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertificateError {
    #[error("Certificate mint rejected: {0}")]
    Rejected(String),
}

/// Retirement certificate (ERC-721) minting
pub trait CertificateMinter {
    fn mint(&mut self, mint: &CertificateMint) -> Result<u64, CertificateError>;

    fn owner_of(&self, token_id: u64) -> Option<Address>;

    fn total_supply(&self) -> u64;
}
