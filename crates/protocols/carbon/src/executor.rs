//! Settlement Executor
//!
//! Runs one settlement end to end: quote, collect input, swap to carbon,
//! refund leftovers, split between donation and destination, record in the
//! ledger and emit events.
//!
//! # Flow
//!
//! Quoted -> Supplied -> Verified -> Swapped -> Split -> Recorded -> Emitted
//!
//! Nothing is transferred before the supplied amount and the ledger update
//! have been checked. If a collaborator fails after funds were collected, the
//! assets still held for this settlement are returned to the contributor and
//! the ledger is left untouched.

use alloy_primitives::{Address, U256};
use discarbon_core::{CarbonConfig, ConfigError, NATIVE_COIN};

use crate::constants::certificate::{MAX_LABEL_LEN, MAX_MESSAGE_LEN};
use crate::estimator::QuoteEstimator;
use crate::interfaces::{
    CertificateMinter, RedemptionFacility, SwapPath, SwapRouter, TokenBank, TokenError,
};
use crate::ledger::ContributionLedger;
use crate::state::{
    AssetQuote, CarbonError, CertificateMint, Destination, FeeSchedule, Payment, QuoteRequest,
    SettlementEvent, SettlementOutcome, SettlementRequest, SettlementStage,
};

// =============================================================================
// Collaborators
// =============================================================================

/// External services a settlement executor drives
pub struct Collaborators {
    pub bank: Box<dyn TokenBank + Send>,
    pub router: Box<dyn SwapRouter + Send>,
    pub redemption: Box<dyn RedemptionFacility + Send>,
    /// Certificate minting is optional; without it certificate requests are rejected.
    pub certificates: Option<Box<dyn CertificateMinter + Send>>,
}

// =============================================================================
// Executor
// =============================================================================

/// Owns the contribution ledger and executes settlements against it
pub struct SettlementExecutor {
    estimator: QuoteEstimator,
    custody: Address,
    collaborators: Collaborators,
    ledger: ContributionLedger,
    events: Vec<SettlementEvent>,
}

impl SettlementExecutor {
    /// `custody` is the account that holds funds while a settlement is in flight
    /// and keeps pooled carbon.
    pub fn new(
        config: CarbonConfig,
        custody: Address,
        collaborators: Collaborators,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if custody == Address::ZERO {
            return Err(ConfigError::ZeroAddress { field: "custody" });
        }
        Ok(Self {
            estimator: QuoteEstimator::new(config),
            custody,
            collaborators,
            ledger: ContributionLedger::new(),
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &CarbonConfig {
        self.estimator.config()
    }

    pub fn ledger(&self) -> &ContributionLedger {
        &self.ledger
    }

    /// Every event emitted so far, oldest first
    pub fn events(&self) -> &[SettlementEvent] {
        &self.events
    }

    /// Redemption fee parameters currently reported by the carbon pool
    pub fn fee_schedule(&self) -> FeeSchedule {
        self.collaborators.redemption.fee_schedule()
    }

    pub fn bank(&self) -> &dyn TokenBank {
        &*self.collaborators.bank
    }

    /// Mutable bank access, e.g. for contributors granting allowances
    pub fn bank_mut(&mut self) -> &mut dyn TokenBank {
        &mut *self.collaborators.bank
    }

    pub fn certificates(&self) -> Option<&dyn CertificateMinter> {
        self.collaborators
            .certificates
            .as_deref()
            .map(|minter| minter as &dyn CertificateMinter)
    }

    /// Quote at current prices. [`NATIVE_COIN`] is priced through the native wrapper.
    pub fn quote(&self, request: &QuoteRequest) -> Result<AssetQuote, CarbonError> {
        let mut priced = request.clone();
        if priced.input_asset == NATIVE_COIN {
            priced.input_asset = self.config().native_wrapper;
        }
        self.estimator.calculate_needed_amount(
            &*self.collaborators.router,
            &*self.collaborators.redemption,
            &priced,
        )
    }

    /// Execute a settlement.
    ///
    /// On error the ledger is unchanged. Failures before the swap leave
    /// balances and allowances as they were; later failures hand the swapped
    /// carbon to the contributor instead.
    pub fn settle(
        &mut self,
        request: &SettlementRequest,
    ) -> Result<SettlementOutcome, CarbonError> {
        self.check_request(request)?;

        let config = self.estimator.config();
        let carbon = config.carbon_token;
        let contributor = request.contributor;
        let desired = request.desired_output;
        let (pay_with, label) = match &request.payment {
            Payment::Native { .. } => (NATIVE_COIN, config.native_label.clone()),
            Payment::Token { asset, .. } => (*asset, config.token_label.clone()),
        };

        // Quoted
        let quote = self.quote(&QuoteRequest {
            input_asset: pay_with,
            desired_output: desired,
            donation_percentage: request.donation_percentage,
            fees_included: request.destination.is_retirement(),
        })?;
        log_stage(SettlementStage::Quoted, contributor);

        // Supplied
        let supplied = request.payment.supplied();
        if supplied < quote.required_input {
            return Err(CarbonError::InsufficientInput {
                label,
                required: quote.required_input,
                supplied,
            });
        }
        log_stage(SettlementStage::Supplied, contributor);

        // Verified
        self.ledger.can_record(contributor, desired)?;
        if quote.path.is_none() && request.payment.is_native() {
            return Err(CarbonError::UnsupportedAsset { asset: NATIVE_COIN });
        }
        log_stage(SettlementStage::Verified, contributor);

        let custody = self.custody;
        let Collaborators {
            bank,
            router,
            redemption,
            certificates,
        } = &mut self.collaborators;

        // Native value arrives in full; tokens are pulled for the quoted amount only.
        let mut pulled = None;
        let collected = match &request.payment {
            Payment::Native { value } => {
                bank.transfer(NATIVE_COIN, contributor, custody, *value)?;
                *value
            }
            Payment::Token { asset, .. } => {
                let allowance = bank.allowance(*asset, contributor, custody);
                bank.transfer_from(*asset, custody, contributor, custody, quote.required_input)?;
                pulled = Some((*asset, allowance));
                quote.required_input
            }
        };

        // Swapped
        let spent = match &quote.path {
            Some(hops) => {
                let swapped = SwapPath::new(hops.clone()).and_then(|path| {
                    router.swap_exact_output(
                        &mut **bank,
                        &path,
                        pay_with,
                        quote.swap_output,
                        collected,
                        custody,
                        custody,
                    )
                });
                match swapped {
                    Ok(spent) => spent,
                    Err(e) => {
                        give_back(&mut **bank, pay_with, custody, contributor, collected);
                        restore_allowance(&mut **bank, pulled, contributor, custody);
                        return Err(e.into());
                    }
                }
            }
            None => collected,
        };

        let refunded = collected.saturating_sub(spent);
        if !refunded.is_zero() {
            if let Err(e) = bank.transfer(pay_with, custody, contributor, refunded) {
                tracing::error!(
                    %contributor,
                    %refunded,
                    error = %e,
                    "Leftover refund failed, returning swapped carbon"
                );
                give_back(&mut **bank, carbon, custody, contributor, quote.swap_output);
                return Err(e.into());
            }
        }
        log_stage(SettlementStage::Swapped, contributor);

        // Split
        let routed = match request.destination {
            Destination::Pool => Ok(()),
            Destination::Forward { to } => bank
                .transfer(carbon, custody, to, desired)
                .map_err(CarbonError::from),
            Destination::Retire => redemption
                .redeem_and_retire(&mut **bank, custody, desired, quote.redemption_fee)
                .map(|_| ())
                .map_err(CarbonError::from),
        };
        if let Err(e) = routed {
            give_back(&mut **bank, carbon, custody, contributor, quote.swap_output);
            if quote.path.is_none() {
                restore_allowance(&mut **bank, pulled, contributor, custody);
            }
            return Err(e);
        }

        let config = self.estimator.config();
        let mut donated = quote.donation_amount;
        if !donated.is_zero() {
            if let Err(e) = bank.transfer(
                carbon,
                custody,
                config.donation_address,
                quote.donation_amount,
            ) {
                tracing::warn!(
                    %contributor,
                    donation = %quote.donation_amount,
                    error = %e,
                    "Donation transfer failed, returning it to contributor"
                );
                give_back(&mut **bank, carbon, custody, contributor, quote.donation_amount);
                donated = U256::ZERO;
            }
        }
        log_stage(SettlementStage::Split, contributor);

        // Recorded
        self.ledger.record(contributor, desired)?;
        log_stage(SettlementStage::Recorded, contributor);

        // Emitted
        let mut events = vec![if request.destination.is_retirement() {
            SettlementEvent::CarbonRetired {
                asset_label: label.clone(),
                amount: desired,
            }
        } else {
            SettlementEvent::ContributionSent {
                asset_label: label.clone(),
                amount: desired,
            }
        }];

        let mut certificate_id = None;
        if let (Some(cert), Some(minter)) = (&request.certificate, certificates.as_mut()) {
            let mint = CertificateMint {
                beneficiary: cert.beneficiary,
                beneficiary_label: cert.beneficiary_label.clone(),
                message: cert.message.clone(),
                retired_amount: desired,
            };
            match minter.mint(&mint) {
                Ok(token_id) => {
                    certificate_id = Some(token_id);
                    events.push(SettlementEvent::CertificateIssued {
                        beneficiary: cert.beneficiary,
                        token_id,
                        amount: desired,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        %contributor,
                        beneficiary = %cert.beneficiary,
                        error = %e,
                        "Certificate mint failed, retirement stands"
                    );
                }
            }
        }
        self.events.extend(events.iter().cloned());
        log_stage(SettlementStage::Emitted, contributor);

        tracing::info!(
            %contributor,
            asset = %pay_with,
            destination = %request.destination,
            carbon = %desired,
            spent = %spent,
            refunded = %refunded,
            "Settlement completed"
        );

        Ok(SettlementOutcome {
            contributor,
            asset_label: label,
            input_asset: pay_with,
            input_spent: spent,
            refunded,
            carbon_amount: desired,
            donation_amount: donated,
            redemption_fee: quote.redemption_fee,
            destination: request.destination,
            certificate_id,
            events,
        })
    }

    /// Checks that need no collaborator
    fn check_request(&self, request: &SettlementRequest) -> Result<(), CarbonError> {
        if request.contributor == Address::ZERO {
            return Err(TokenError::ZeroAddress.into());
        }
        if request.desired_output.is_zero() {
            return Err(CarbonError::InvalidAmount {
                message: "desired carbon amount must be greater than zero".to_string(),
            });
        }
        if let Destination::Forward { to } = request.destination {
            if to == Address::ZERO {
                return Err(TokenError::ZeroAddress.into());
            }
        }

        let Some(cert) = &request.certificate else {
            return Ok(());
        };
        let reason = if !request.destination.is_retirement() {
            Some("certificates are only issued for retirements")
        } else if self.collaborators.certificates.is_none() {
            Some("certificate minting is not available")
        } else if cert.beneficiary == Address::ZERO {
            Some("beneficiary must not be the zero address")
        } else if cert.beneficiary_label.len() > MAX_LABEL_LEN {
            Some("beneficiary label too long")
        } else if cert.message.len() > MAX_MESSAGE_LEN {
            Some("retirement message too long")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(CarbonError::InvalidCertificate {
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn log_stage(stage: SettlementStage, contributor: Address) {
    tracing::debug!(?stage, %contributor, "Settlement stage reached");
}

/// Reset the allowance a token pull consumed.
fn restore_allowance(
    bank: &mut dyn TokenBank,
    pulled: Option<(Address, U256)>,
    contributor: Address,
    custody: Address,
) {
    if let Some((token, allowance)) = pulled {
        bank.approve(token, contributor, custody, allowance);
    }
}

/// Return assets held in custody to the contributor after a failure.
fn give_back(
    bank: &mut dyn TokenBank,
    token: Address,
    custody: Address,
    contributor: Address,
    amount: U256,
) {
    if amount.is_zero() {
        return;
    }
    if let Err(e) = bank.transfer(token, custody, contributor, amount) {
        tracing::error!(
            %token,
            %contributor,
            %amount,
            error = %e,
            "Failed to return assets to contributor"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::RouterError;
    use crate::state::CertificateRequest;
    use crate::testing::{
        polygon_fixture, units, wad, Fixture, CUSTODY, FEE_RECIPIENT, ROUTER_ACCOUNT,
    };
    use alloy_primitives::address;
    use discarbon_core::constants::{DAI, DONATION_ADDRESS, NCT, USDC, WMATIC};

    const ALICE: Address = address!("a11ce00000000000000000000000000000000001");
    const BOB: Address = address!("b0b0000000000000000000000000000000000002");
    const CAROL: Address = address!("ca10100000000000000000000000000000000003");

    fn funded_executor() -> SettlementExecutor {
        let mut fx = polygon_fixture();
        fx.fund(ALICE);
        fx.fund(BOB);
        fx.into_executor()
    }

    fn milli(n: u64) -> U256 {
        wad(n) / U256::from(1000u64)
    }

    fn request(contributor: Address, payment: Payment, desired: U256) -> SettlementRequest {
        SettlementRequest {
            contributor,
            payment,
            desired_output: desired,
            donation_percentage: 0,
            destination: Destination::Pool,
            certificate: None,
        }
    }

    fn token_quote(executor: &SettlementExecutor, asset: Address, desired: U256) -> U256 {
        executor
            .quote(&QuoteRequest {
                input_asset: asset,
                desired_output: desired,
                donation_percentage: 0,
                fees_included: false,
            })
            .unwrap()
            .required_input
    }

    #[test]
    fn test_native_contributions_accumulate() {
        let mut executor = funded_executor();

        let first = executor
            .settle(&request(
                ALICE,
                Payment::Native {
                    value: wad(123) / U256::from(10_000u64),
                },
                milli(1),
            ))
            .unwrap();
        executor
            .settle(&request(
                BOB,
                Payment::Native {
                    value: wad(234) / U256::from(10_000u64),
                },
                milli(2),
            ))
            .unwrap();

        let ledger = executor.ledger();
        assert_eq!(ledger.contributors(), &[ALICE, BOB]);
        assert_eq!(ledger.contribution_of(ALICE), milli(1));
        assert_eq!(ledger.contribution_of(BOB), milli(2));
        assert_eq!(ledger.total(), milli(3));

        assert_eq!(
            first.events,
            vec![SettlementEvent::ContributionSent {
                asset_label: "Matic".to_string(),
                amount: milli(1),
            }]
        );
        assert!(!first.refunded.is_zero());
        assert_eq!(
            executor.bank().balance_of(NATIVE_COIN, ALICE),
            wad(100) - first.input_spent
        );
        assert_eq!(executor.bank().balance_of(NCT, CUSTODY), milli(3));
        assert_eq!(executor.events().len(), 2);
    }

    #[test]
    fn test_exact_quote_is_enough() {
        let mut executor = funded_executor();
        let required = token_quote(&executor, DAI, wad(1));
        executor.bank_mut().approve(DAI, ALICE, CUSTODY, required);

        let outcome = executor
            .settle(&request(
                ALICE,
                Payment::Token {
                    asset: DAI,
                    amount: required,
                },
                wad(1),
            ))
            .unwrap();

        assert_eq!(outcome.input_spent, required);
        assert_eq!(outcome.refunded, U256::ZERO);
        assert_eq!(outcome.asset_label, "Token");
        assert_eq!(executor.bank().balance_of(DAI, ALICE), wad(50) - required);
        assert_eq!(executor.ledger().contribution_of(ALICE), wad(1));
    }

    #[test]
    fn test_one_unit_short_is_rejected() {
        let mut executor = funded_executor();
        let required = token_quote(&executor, DAI, wad(1));
        executor.bank_mut().approve(DAI, ALICE, CUSTODY, required);

        let err = executor
            .settle(&request(
                ALICE,
                Payment::Token {
                    asset: DAI,
                    amount: required - U256::from(1u64),
                },
                wad(1),
            ))
            .unwrap_err();

        assert!(matches!(err, CarbonError::InsufficientInput { .. }));
        assert_eq!(err.to_string(), "Not enough Token to swap to required carbon Token");
        assert!(executor.ledger().is_empty());
        assert_eq!(executor.bank().balance_of(DAI, ALICE), wad(50));
    }

    #[test]
    fn test_native_short_uses_native_label() {
        let mut executor = funded_executor();
        let err = executor
            .settle(&request(ALICE, Payment::Native { value: U256::from(1u64) }, wad(1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Not enough Matic to swap to required carbon Token");
        assert_eq!(executor.bank().balance_of(NATIVE_COIN, ALICE), wad(100));
    }

    #[test]
    fn test_allowance_one_unit_short() {
        let mut executor = funded_executor();
        let required = token_quote(&executor, USDC, milli(10));
        executor
            .bank_mut()
            .approve(USDC, ALICE, CUSTODY, required - U256::from(1u64));

        let err = executor
            .settle(&request(
                ALICE,
                Payment::Token {
                    asset: USDC,
                    amount: required,
                },
                milli(10),
            ))
            .unwrap_err();

        assert!(matches!(
            err,
            CarbonError::Token(TokenError::InsufficientAllowance { .. })
        ));
        assert!(err.to_string().starts_with("ERC20: insufficient allowance"));
        assert!(executor.ledger().is_empty());
        assert_eq!(executor.bank().balance_of(USDC, ALICE), units(50, 6));
    }

    #[test]
    fn test_donation_split() {
        let mut executor = funded_executor();
        let desired = U256::from(1_001u64);
        let supplied = U256::from(1_151u64);
        executor.bank_mut().approve(NCT, ALICE, CUSTODY, supplied);

        let outcome = executor
            .settle(&SettlementRequest {
                donation_percentage: 15,
                ..request(
                    ALICE,
                    Payment::Token {
                        asset: NCT,
                        amount: supplied,
                    },
                    desired,
                )
            })
            .unwrap();

        // floor(1001 * 15 / 100) = 150
        assert_eq!(outcome.donation_amount, U256::from(150u64));
        assert_eq!(outcome.input_spent, U256::from(1_151u64));
        assert_eq!(executor.bank().balance_of(NCT, DONATION_ADDRESS), U256::from(150u64));
        assert_eq!(executor.bank().balance_of(NCT, CUSTODY), desired);
        assert_eq!(executor.ledger().contribution_of(ALICE), desired);
    }

    #[test]
    fn test_carbon_input_skips_router() {
        let mut executor = funded_executor();
        let router_nct = executor.bank().balance_of(NCT, ROUTER_ACCOUNT);
        executor.bank_mut().approve(NCT, ALICE, CUSTODY, wad(5));

        let outcome = executor
            .settle(&request(
                ALICE,
                Payment::Token {
                    asset: NCT,
                    amount: wad(5),
                },
                wad(2),
            ))
            .unwrap();

        assert_eq!(outcome.input_spent, wad(2));
        assert_eq!(executor.bank().balance_of(NCT, ALICE), wad(48));
        assert_eq!(executor.bank().balance_of(NCT, ROUTER_ACCOUNT), router_nct);
        // Only the quoted amount is pulled
        assert_eq!(executor.bank().allowance(NCT, ALICE, CUSTODY), wad(3));
    }

    #[test]
    fn test_forward_destination() {
        let mut executor = funded_executor();
        let required = token_quote(&executor, USDC, milli(500));
        executor.bank_mut().approve(USDC, ALICE, CUSTODY, required);

        let outcome = executor
            .settle(&SettlementRequest {
                destination: Destination::Forward { to: CAROL },
                ..request(
                    ALICE,
                    Payment::Token {
                        asset: USDC,
                        amount: required,
                    },
                    milli(500),
                )
            })
            .unwrap();

        assert_eq!(executor.bank().balance_of(NCT, CAROL), milli(500));
        assert_eq!(executor.bank().balance_of(NCT, CUSTODY), U256::ZERO);
        assert!(matches!(
            outcome.events[0],
            SettlementEvent::ContributionSent { .. }
        ));
    }

    #[test]
    fn test_retire_with_certificate() {
        let mut executor = funded_executor();
        let quote = executor
            .quote(&QuoteRequest {
                input_asset: DAI,
                desired_output: wad(1),
                donation_percentage: 0,
                fees_included: true,
            })
            .unwrap();
        executor
            .bank_mut()
            .approve(DAI, ALICE, CUSTODY, quote.required_input);

        let outcome = executor
            .settle(&SettlementRequest {
                destination: Destination::Retire,
                certificate: Some(CertificateRequest {
                    beneficiary: CAROL,
                    beneficiary_label: "Carol".to_string(),
                    message: "Offsetting the team offsite".to_string(),
                }),
                ..request(
                    ALICE,
                    Payment::Token {
                        asset: DAI,
                        amount: quote.required_input,
                    },
                    wad(1),
                )
            })
            .unwrap();

        assert_eq!(outcome.redemption_fee, quote.redemption_fee);
        assert_eq!(outcome.certificate_id, Some(1));
        assert_eq!(
            outcome.events,
            vec![
                SettlementEvent::CarbonRetired {
                    asset_label: "Token".to_string(),
                    amount: wad(1),
                },
                SettlementEvent::CertificateIssued {
                    beneficiary: CAROL,
                    token_id: 1,
                    amount: wad(1),
                },
            ]
        );
        assert_eq!(executor.bank().balance_of(NCT, CUSTODY), U256::ZERO);
        assert_eq!(
            executor.bank().balance_of(NCT, FEE_RECIPIENT),
            quote.redemption_fee
        );
        let certificates = executor.certificates().unwrap();
        assert_eq!(certificates.owner_of(1), Some(CAROL));
        assert_eq!(certificates.total_supply(), 1);
        assert_eq!(executor.ledger().contribution_of(ALICE), wad(1));
    }

    #[test]
    fn test_certificate_requires_retirement() {
        let mut executor = funded_executor();
        let err = executor
            .settle(&SettlementRequest {
                certificate: Some(CertificateRequest {
                    beneficiary: CAROL,
                    beneficiary_label: "Carol".to_string(),
                    message: String::new(),
                }),
                ..request(ALICE, Payment::Native { value: wad(1) }, milli(1))
            })
            .unwrap_err();
        assert!(matches!(err, CarbonError::InvalidCertificate { .. }));
        assert_eq!(executor.bank().balance_of(NATIVE_COIN, ALICE), wad(100));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut executor = funded_executor();
        let err = executor
            .settle(&request(ALICE, Payment::Native { value: wad(1) }, U256::ZERO))
            .unwrap_err();
        assert!(matches!(err, CarbonError::InvalidAmount { .. }));
        assert!(executor.events().is_empty());
    }

    #[test]
    fn test_unsupported_token_rejected() {
        let mut executor = funded_executor();
        let stranger = Address::repeat_byte(0x42);
        let err = executor
            .settle(&request(
                ALICE,
                Payment::Token {
                    asset: stranger,
                    amount: wad(1),
                },
                milli(1),
            ))
            .unwrap_err();
        assert!(matches!(err, CarbonError::UnsupportedAsset { asset } if asset == stranger));
    }

    #[test]
    fn test_swap_failure_returns_funds() {
        let mut fx: Fixture = polygon_fixture();
        fx.fund(ALICE);
        fx.router.halt();
        let mut executor = fx.into_executor();

        let err = executor
            .settle(&request(ALICE, Payment::Native { value: wad(1) }, milli(1)))
            .unwrap_err();

        assert!(matches!(
            err,
            CarbonError::Router(RouterError::InsufficientLiquidity)
        ));
        assert_eq!(executor.bank().balance_of(NATIVE_COIN, ALICE), wad(100));
        assert_eq!(executor.bank().balance_of(NATIVE_COIN, CUSTODY), U256::ZERO);
        assert!(executor.ledger().is_empty());
    }

    #[test]
    fn test_token_swap_failure_restores_allowance() {
        let mut fx = polygon_fixture();
        fx.fund(ALICE);
        fx.router.halt();
        let mut executor = fx.into_executor();
        executor.bank_mut().approve(DAI, ALICE, CUSTODY, wad(10));

        let err = executor
            .settle(&request(
                ALICE,
                Payment::Token {
                    asset: DAI,
                    amount: wad(10),
                },
                wad(1),
            ))
            .unwrap_err();

        assert!(matches!(err, CarbonError::Router(_)));
        assert_eq!(executor.bank().balance_of(DAI, ALICE), wad(50));
        assert_eq!(executor.bank().balance_of(DAI, CUSTODY), U256::ZERO);
        assert_eq!(executor.bank().allowance(DAI, ALICE, CUSTODY), wad(10));
        assert!(executor.ledger().is_empty());
    }

    #[test]
    fn test_failed_refund_returns_swapped_carbon() {
        let mut fx = polygon_fixture();
        fx.fund(ALICE);
        // Leftover native value cannot reach the contributor
        fx.bank.freeze(NATIVE_COIN, ALICE);
        let mut executor = fx.into_executor();

        let err = executor
            .settle(&request(ALICE, Payment::Native { value: wad(1) }, milli(1)))
            .unwrap_err();

        match err {
            CarbonError::Token(TokenError::Frozen { account, .. }) => assert_eq!(account, ALICE),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(executor.ledger().is_empty());
        assert!(executor.events().is_empty());
        assert_eq!(executor.bank().balance_of(NCT, ALICE), wad(50) + milli(1));
        assert_eq!(executor.bank().balance_of(NCT, CUSTODY), U256::ZERO);
    }

    #[test]
    fn test_failed_donation_reports_zero() {
        let mut fx = polygon_fixture();
        fx.fund(ALICE);
        fx.bank.freeze(NCT, DONATION_ADDRESS);
        let mut executor = fx.into_executor();

        let outcome = executor
            .settle(&SettlementRequest {
                donation_percentage: 10,
                ..request(ALICE, Payment::Native { value: wad(1) }, milli(1))
            })
            .unwrap();

        assert_eq!(outcome.donation_amount, U256::ZERO);
        assert_eq!(executor.bank().balance_of(NCT, DONATION_ADDRESS), U256::ZERO);
        // The tenth meant for donation went back to the contributor
        assert_eq!(
            executor.bank().balance_of(NCT, ALICE),
            wad(50) + milli(1) / U256::from(10u64)
        );
        assert_eq!(executor.bank().balance_of(NCT, CUSTODY), milli(1));
        assert_eq!(executor.ledger().contribution_of(ALICE), milli(1));
    }

    #[test]
    fn test_native_exact_quote_and_one_short() {
        let mut executor = funded_executor();

        let required = token_quote(&executor, NATIVE_COIN, milli(1));
        let outcome = executor
            .settle(&request(ALICE, Payment::Native { value: required }, milli(1)))
            .unwrap();
        assert_eq!(outcome.input_spent, required);
        assert_eq!(outcome.refunded, U256::ZERO);
        assert_eq!(
            executor.bank().balance_of(NATIVE_COIN, ALICE),
            wad(100) - required
        );

        // Reserves moved, so quote again
        let required = token_quote(&executor, NATIVE_COIN, milli(1));
        let short = required - U256::from(1u64);
        let err = executor
            .settle(&request(BOB, Payment::Native { value: short }, milli(1)))
            .unwrap_err();
        match err {
            CarbonError::InsufficientInput {
                label,
                required: needed,
                supplied,
            } => {
                assert_eq!(label, "Matic");
                assert_eq!(needed, required);
                assert_eq!(supplied, short);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(executor.bank().balance_of(NATIVE_COIN, BOB), wad(100));
        assert_eq!(executor.ledger().len(), 1);
        assert_eq!(executor.ledger().contribution_of(BOB), U256::ZERO);
    }

    #[test]
    fn test_native_quote_uses_wrapper_price() {
        let executor = funded_executor();
        let native = token_quote(&executor, NATIVE_COIN, milli(1));
        let wrapped = token_quote(&executor, WMATIC, milli(1));
        assert_eq!(native, wrapped);
    }

    #[test]
    fn test_rejects_zero_custody() {
        let mut fx = polygon_fixture();
        fx.custody = Address::ZERO;
        let collaborators = Collaborators {
            bank: Box::new(fx.bank),
            router: Box::new(fx.router),
            redemption: Box::new(fx.redemption),
            certificates: None,
        };
        let result = SettlementExecutor::new(fx.config, fx.custody, collaborators);
        assert!(matches!(result, Err(ConfigError::ZeroAddress { field: "custody" })));
    }
}
