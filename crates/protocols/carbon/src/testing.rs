//! In-memory collaborators
//!
//! Deterministic stand-ins for the token contracts, swap router, carbon pool
//! and certificate contract. Used by this crate's tests and, through the
//! `testing` feature, by dependent crates.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{address, Address, U256};
use discarbon_core::constants::{DAI, NCT, USDC, WETH, WMATIC};
use discarbon_core::{CarbonConfig, NATIVE_COIN};

use crate::calculator::{calculate_input, redemption_fee};
use crate::constants::{fees, redemption};
use crate::executor::{Collaborators, SettlementExecutor};
use crate::interfaces::{
    CertificateError, CertificateMinter, PriceSource, RedemptionError, RedemptionFacility,
    RouterError, SwapPath, SwapRouter, TokenBank, TokenError,
};
use crate::state::{CertificateMint, FeeSchedule};

/// Account of the settlement desk itself
pub const CUSTODY: Address = address!("d15c000000000000000000000000000000000001");

/// Account holding the router's pair reserves
pub const ROUTER_ACCOUNT: Address = address!("5a1e000000000000000000000000000000000002");

/// Receiver of carbon pool redemption fees
pub const FEE_RECIPIENT: Address = address!("fee0000000000000000000000000000000000003");

/// `n` whole units of an 18-decimal token
pub fn wad(n: u64) -> U256 {
    units(n, 18)
}

/// `n` whole units of a token with `decimals` places
pub fn units(n: u64, decimals: u8) -> U256 {
    let mut scale = U256::from(1u64);
    for _ in 0..decimals {
        scale *= U256::from(10u64);
    }
    U256::from(n) * scale
}

// ---------------------------------------------------------------------------
// Token bank
// ---------------------------------------------------------------------------

/// Balances and allowances for any number of tokens, native coin included
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    frozen: HashSet<(Address, Address)>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        let balance = self.balances.entry((token, to)).or_insert(U256::ZERO);
        *balance = balance.saturating_add(amount);
    }

    /// Refuse further transfers of `token` into `account`.
    pub fn freeze(&mut self, token: Address, account: Address) {
        self.frozen.insert((token, account));
    }

    fn debit(&mut self, token: Address, owner: Address, amount: U256) -> Result<(), TokenError> {
        let balance = self.balance_of(token, owner);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                token,
                owner,
                balance,
                needed: amount,
            });
        }
        self.balances.insert((token, owner), balance - amount);
        Ok(())
    }
}

impl TokenBank for InMemoryBank {
    fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        if to == Address::ZERO {
            return Err(TokenError::ZeroAddress);
        }
        if self.frozen.contains(&(token, to)) {
            return Err(TokenError::Frozen { token, account: to });
        }
        self.debit(token, from, amount)?;
        self.mint(token, to, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let allowance = self.allowance(token, from, spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                token,
                owner: from,
                spender,
                allowance,
                needed: amount,
            });
        }
        self.transfer(token, from, to, amount)?;
        self.allowances
            .insert((token, from, spender), allowance - amount);
        Ok(())
    }

    fn burn(&mut self, token: Address, from: Address, amount: U256) -> Result<(), TokenError> {
        self.debit(token, from, amount)
    }
}

// ---------------------------------------------------------------------------
// Constant product router
// ---------------------------------------------------------------------------

/// Uniswap V2 style router over in-memory pairs
#[derive(Debug, Clone)]
pub struct ConstantProductRouter {
    account: Address,
    native_wrapper: Address,
    pairs: HashMap<(Address, Address), (U256, U256)>,
    fee_num: u64,
    fee_denom: u64,
    halted: bool,
}

impl ConstantProductRouter {
    pub fn new(account: Address, native_wrapper: Address) -> Self {
        Self {
            account,
            native_wrapper,
            pairs: HashMap::new(),
            fee_num: fees::DEFAULT_FEE_NUM,
            fee_denom: fees::DEFAULT_FEE_DENOM,
            halted: false,
        }
    }

    /// Create a pair and deposit its reserves into the router account.
    pub fn add_pair(
        &mut self,
        bank: &mut InMemoryBank,
        token_a: Address,
        reserve_a: U256,
        token_b: Address,
        reserve_b: U256,
    ) {
        bank.mint(token_a, self.account, reserve_a);
        bank.mint(token_b, self.account, reserve_b);
        if token_a < token_b {
            self.pairs.insert((token_a, token_b), (reserve_a, reserve_b));
        } else {
            self.pairs.insert((token_b, token_a), (reserve_b, reserve_a));
        }
    }

    /// Quotes keep working but swaps fail, as when a pair is paused.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Reserves oriented as (reserve of `token_in`, reserve of `token_out`)
    pub fn reserves(&self, token_in: Address, token_out: Address) -> Option<(U256, U256)> {
        if token_in < token_out {
            self.pairs.get(&(token_in, token_out)).copied()
        } else {
            self.pairs
                .get(&(token_out, token_in))
                .map(|(a, b)| (*b, *a))
        }
    }

    fn set_reserves(&mut self, token_in: Address, token_out: Address, r_in: U256, r_out: U256) {
        if token_in < token_out {
            self.pairs.insert((token_in, token_out), (r_in, r_out));
        } else {
            self.pairs.insert((token_out, token_in), (r_out, r_in));
        }
    }

    /// Required amount at every position of the path, last one being `amount_out`.
    pub fn amounts_in(&self, path: &SwapPath, amount_out: U256) -> Result<Vec<U256>, RouterError> {
        let hops = path.hops();
        let mut amounts = vec![U256::ZERO; hops.len()];
        amounts[hops.len() - 1] = amount_out;

        for i in (1..hops.len()).rev() {
            let (token_in, token_out) = (hops[i - 1], hops[i]);
            let (reserve_in, reserve_out) =
                self.reserves(token_in, token_out)
                    .ok_or(RouterError::NoPair {
                        token_in,
                        token_out,
                    })?;
            amounts[i - 1] = calculate_input(
                reserve_in,
                reserve_out,
                amounts[i],
                self.fee_num,
                self.fee_denom,
            )
            .ok_or(RouterError::InsufficientLiquidity)?;
        }
        Ok(amounts)
    }
}

impl PriceSource for ConstantProductRouter {
    fn amount_in(&self, path: &SwapPath, amount_out: U256) -> Result<U256, RouterError> {
        Ok(self.amounts_in(path, amount_out)?[0])
    }
}

impl SwapRouter for ConstantProductRouter {
    fn swap_exact_output(
        &mut self,
        bank: &mut dyn TokenBank,
        path: &SwapPath,
        pay_with: Address,
        amount_out: U256,
        max_in: U256,
        payer: Address,
        recipient: Address,
    ) -> Result<U256, RouterError> {
        if self.halted {
            return Err(RouterError::InsufficientLiquidity);
        }
        let wraps_native = pay_with == NATIVE_COIN && path.input() == self.native_wrapper;
        if pay_with != path.input() && !wraps_native {
            return Err(RouterError::InvalidPath);
        }

        let amounts = self.amounts_in(path, amount_out)?;
        if amounts[0] > max_in {
            return Err(RouterError::ExcessiveInputAmount {
                required: amounts[0],
                max_in,
            });
        }

        bank.transfer(pay_with, payer, self.account, amounts[0])?;
        bank.transfer(path.output(), self.account, recipient, amount_out)?;

        let hops = path.hops();
        for i in 1..hops.len() {
            let (token_in, token_out) = (hops[i - 1], hops[i]);
            if let Some((r_in, r_out)) = self.reserves(token_in, token_out) {
                self.set_reserves(token_in, token_out, r_in + amounts[i - 1], r_out - amounts[i]);
            }
        }
        Ok(amounts[0])
    }
}

// ---------------------------------------------------------------------------
// Carbon pool redemption
// ---------------------------------------------------------------------------

/// Carbon pool that charges its redemption fee and burns the rest
#[derive(Debug, Clone)]
pub struct PoolRedemption {
    carbon_token: Address,
    fee_recipient: Address,
    schedule: FeeSchedule,
    retired: U256,
}

impl PoolRedemption {
    pub fn new(carbon_token: Address, fee_recipient: Address, schedule: FeeSchedule) -> Self {
        Self {
            carbon_token,
            fee_recipient,
            schedule,
            retired: U256::ZERO,
        }
    }

    /// Total carbon retired through this pool
    pub fn retired(&self) -> U256 {
        self.retired
    }
}

impl RedemptionFacility for PoolRedemption {
    fn fee_schedule(&self) -> FeeSchedule {
        self.schedule
    }

    fn redeem_and_retire(
        &mut self,
        bank: &mut dyn TokenBank,
        holder: Address,
        amount: U256,
        fee: U256,
    ) -> Result<U256, RedemptionError> {
        let expected =
            redemption_fee(amount, &self.schedule).ok_or(RedemptionError::InvalidFeeSchedule)?;
        if fee != expected {
            return Err(RedemptionError::FeeMismatch {
                expected,
                provided: fee,
            });
        }

        let needed = amount.saturating_add(fee);
        let balance = bank.balance_of(self.carbon_token, holder);
        if balance < needed {
            return Err(TokenError::InsufficientBalance {
                token: self.carbon_token,
                owner: holder,
                balance,
                needed,
            }
            .into());
        }

        if !fee.is_zero() {
            bank.transfer(self.carbon_token, holder, self.fee_recipient, fee)?;
        }
        bank.burn(self.carbon_token, holder, amount)?;
        self.retired = self.retired.saturating_add(amount);
        Ok(amount)
    }
}

// ---------------------------------------------------------------------------
// Certificates
// ---------------------------------------------------------------------------

/// ERC-721 style certificate registry, token ids start at 1
#[derive(Debug, Clone, Default)]
pub struct CertificateRegistry {
    certificates: Vec<CertificateMint>,
}

impl CertificateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn certificate(&self, token_id: u64) -> Option<&CertificateMint> {
        let index = usize::try_from(token_id).ok()?.checked_sub(1)?;
        self.certificates.get(index)
    }
}

impl CertificateMinter for CertificateRegistry {
    fn mint(&mut self, mint: &CertificateMint) -> Result<u64, CertificateError> {
        if mint.beneficiary == Address::ZERO {
            return Err(CertificateError::Rejected(
                "mint to the zero address".to_string(),
            ));
        }
        self.certificates.push(mint.clone());
        Ok(self.certificates.len() as u64)
    }

    fn owner_of(&self, token_id: u64) -> Option<Address> {
        self.certificate(token_id).map(|c| c.beneficiary)
    }

    fn total_supply(&self) -> u64 {
        self.certificates.len() as u64
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// Polygon-like world: the default asset list, pairs routed through USDC and
/// a 10% carbon pool redemption fee.
pub struct Fixture {
    pub config: CarbonConfig,
    pub bank: InMemoryBank,
    pub router: ConstantProductRouter,
    pub redemption: PoolRedemption,
    pub certificates: CertificateRegistry,
    pub custody: Address,
}

/// 1 NCT ~ 2 USDC, 1 WMATIC ~ 0.5 USDC, 1 DAI ~ 1 USDC, 1 WETH ~ 1200 USDC
pub fn polygon_fixture() -> Fixture {
    let config = CarbonConfig::default();
    let mut bank = InMemoryBank::new();
    let mut router = ConstantProductRouter::new(ROUTER_ACCOUNT, config.native_wrapper);

    router.add_pair(&mut bank, USDC, units(2_000_000, 6), NCT, wad(1_000_000));
    router.add_pair(&mut bank, WMATIC, wad(10_000_000), USDC, units(5_000_000, 6));
    router.add_pair(&mut bank, DAI, wad(5_000_000), USDC, units(5_000_000, 6));
    router.add_pair(&mut bank, WETH, wad(2_000), USDC, units(2_400_000, 6));

    let redemption = PoolRedemption::new(
        config.carbon_token,
        FEE_RECIPIENT,
        FeeSchedule {
            fee_rate_in_base: U256::from(redemption::DEFAULT_FEE_RATE_IN_BASE),
            fee_divider: U256::from(redemption::DEFAULT_FEE_DIVIDER),
        },
    );

    Fixture {
        config,
        bank,
        router,
        redemption,
        certificates: CertificateRegistry::new(),
        custody: CUSTODY,
    }
}

impl Fixture {
    /// Give `who` 100 native coin and 50 of every listed token.
    pub fn fund(&mut self, who: Address) {
        self.bank.mint(NATIVE_COIN, who, wad(100));
        for asset in &self.config.supported_assets {
            self.bank
                .mint(asset.address, who, units(50, asset.decimals));
        }
    }

    /// Wire everything into an executor, with certificate minting enabled.
    pub fn into_executor(self) -> SettlementExecutor {
        let collaborators = Collaborators {
            bank: Box::new(self.bank),
            router: Box::new(self.router),
            redemption: Box::new(self.redemption),
            certificates: Some(Box::new(self.certificates)),
        };
        match SettlementExecutor::new(self.config, self.custody, collaborators) {
            Ok(executor) => executor,
            Err(e) => panic!("fixture config is invalid: {e}"),
        }
    }
}
