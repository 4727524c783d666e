//! Carbon Calculator
//!
//! Pure math for donation splits, redemption fees and exact-output swaps.
//! No node, no state. Every function returns `None` instead of wrapping on
//! overflow so callers can fail closed.

use alloy_primitives::U256;
use discarbon_core::constants::PERCENT_DENOM;

use crate::state::FeeSchedule;

/// Donation share of an amount.
///
/// Formula: amount * percentage / 100 (floor)
pub fn donation_share(amount: U256, percentage: u8) -> Option<U256> {
    amount
        .checked_mul(U256::from(percentage))?
        .checked_div(U256::from(PERCENT_DENOM))
}

/// Redemption fee charged by the carbon pool when redeeming `amount`.
///
/// Formula: amount * divider / (divider - fee_rate) - amount
///
/// Returns `None` if the schedule is degenerate (rate >= divider) or on overflow.
pub fn redemption_fee(amount: U256, schedule: &FeeSchedule) -> Option<U256> {
    if schedule.fee_divider <= schedule.fee_rate_in_base {
        return None;
    }
    if amount.is_zero() || schedule.fee_rate_in_base.is_zero() {
        return Some(U256::ZERO);
    }
    let net_divider = schedule.fee_divider - schedule.fee_rate_in_base;
    let gross = amount
        .checked_mul(schedule.fee_divider)?
        .checked_div(net_divider)?;
    gross.checked_sub(amount)
}

/// Calculate required input for desired output (reverse constant product)
///
/// Formula: input = (reserves_in * output * fee_denom) / ((reserves_out - output) * fee_num) + 1
pub fn calculate_input(
    reserves_in: U256,
    reserves_out: U256,
    output_amount: U256,
    fee_num: u64,
    fee_denom: u64,
) -> Option<U256> {
    if reserves_in.is_zero() || reserves_out.is_zero() || output_amount.is_zero() {
        return None;
    }
    if output_amount >= reserves_out {
        return None; // Can't take more than reserves
    }

    let numerator = reserves_in
        .checked_mul(output_amount)?
        .checked_mul(U256::from(fee_denom))?;
    let denominator = (reserves_out - output_amount).checked_mul(U256::from(fee_num))?;

    if denominator.is_zero() {
        return None;
    }

    (numerator / denominator).checked_add(U256::from(1u64)) // Round up
}
