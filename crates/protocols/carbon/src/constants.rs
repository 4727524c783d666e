//! Carbon Protocol Constants
//!
//! Fee parameters for the carbon pool redemption and the swap venue.

/// Redemption fee parameters of the carbon pool token
pub mod redemption {
    /// Default redeem fee in base units (10% with the divider below)
    pub const DEFAULT_FEE_RATE_IN_BASE: u64 = 1_000;

    /// Default redeem fee divider
    pub const DEFAULT_FEE_DIVIDER: u64 = 10_000;
}

/// Swap venue fee constants (Uniswap V2 style pairs)
pub mod fees {
    /// Default fee numerator (0.3% fee = 997/1000)
    pub const DEFAULT_FEE_NUM: u64 = 997;

    /// Default fee denominator
    pub const DEFAULT_FEE_DENOM: u64 = 1000;
}

/// Certificate text limits
pub mod certificate {
    /// Maximum bytes of the beneficiary label
    pub const MAX_LABEL_LEN: usize = 128;

    /// Maximum bytes of the retirement message
    pub const MAX_MESSAGE_LEN: usize = 1024;
}
