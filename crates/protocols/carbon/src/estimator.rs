//! Quote Estimator
//!
//! Computes how much of an allow-listed asset is needed to end up with a
//! desired amount of carbon, including the donation share and, optionally,
//! the pool's redemption fee. Reads only; the result follows live router
//! prices and may differ between calls.

use alloy_primitives::{Address, U256};
use discarbon_core::{constants::MAX_DONATION_PERCENTAGE, CarbonConfig};

use crate::calculator::{donation_share, redemption_fee};
use crate::interfaces::{PriceSource, RedemptionFacility, RouterError, SwapPath};
use crate::state::{AssetQuote, CarbonError, QuoteRequest};

/// Quote Estimator bound to an asset allow-list
#[derive(Debug, Clone)]
pub struct QuoteEstimator {
    config: CarbonConfig,
}

impl QuoteEstimator {
    pub fn new(config: CarbonConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CarbonConfig {
        &self.config
    }

    /// Router path from `input` to the carbon token, via the hub token unless
    /// the input is the hub itself.
    pub fn route(&self, input: Address) -> Result<SwapPath, RouterError> {
        let carbon = self.config.carbon_token;
        let hub = self.config.hub_token;
        if input == hub || hub == carbon {
            SwapPath::new(vec![input, carbon])
        } else {
            SwapPath::new(vec![input, hub, carbon])
        }
    }

    /// Input amount needed for `request.desired_output` carbon.
    ///
    /// Zero desired output quotes zero without consulting the router. When
    /// the input is the carbon token itself the quote is 1:1.
    pub fn calculate_needed_amount<P, R>(
        &self,
        prices: &P,
        redemption: &R,
        request: &QuoteRequest,
    ) -> Result<AssetQuote, CarbonError>
    where
        P: PriceSource + ?Sized,
        R: RedemptionFacility + ?Sized,
    {
        if request.donation_percentage > MAX_DONATION_PERCENTAGE {
            return Err(CarbonError::InvalidDonation {
                percentage: request.donation_percentage,
            });
        }
        if !self.config.is_supported(request.input_asset) {
            return Err(CarbonError::UnsupportedAsset {
                asset: request.input_asset,
            });
        }

        let carbon = self.config.carbon_token;
        let desired = request.desired_output;

        let donation_amount = donation_share(desired, request.donation_percentage)
            .ok_or(CarbonError::Overflow {
                context: "donation share",
            })?;
        let fee = if request.fees_included {
            redemption_fee(desired, &redemption.fee_schedule()).ok_or(CarbonError::Overflow {
                context: "redemption fee",
            })?
        } else {
            U256::ZERO
        };
        let swap_output = desired
            .checked_add(donation_amount)
            .and_then(|v| v.checked_add(fee))
            .ok_or(CarbonError::Overflow {
                context: "swap output",
            })?;

        let (required_input, path) = if swap_output.is_zero() {
            (U256::ZERO, None)
        } else if request.input_asset == carbon {
            (swap_output, None)
        } else {
            let path = self.route(request.input_asset)?;
            let required = prices.amount_in(&path, swap_output)?;
            (required, Some(path.into_inner()))
        };

        tracing::debug!(
            input = %request.input_asset,
            desired = %desired,
            donation = %donation_amount,
            fee = %fee,
            required = %required_input,
            direct = path.is_none(),
            "Calculated needed amount"
        );

        Ok(AssetQuote {
            input_asset: request.input_asset,
            output_asset: carbon,
            desired_output: desired,
            donation_amount,
            redemption_fee: fee,
            swap_output,
            required_input,
            path,
        })
    }
}
