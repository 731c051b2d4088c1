//! Charge-side fee model.
//!
//! Translates the net amount a gift should receive into the gross amount a
//! contributor's card must be charged, so that after the processor deducts
//! its percentage and fixed fee exactly the net remains. All arithmetic is
//! integer cents with half-up rounding; the functions are pure and
//! deterministic.

use crate::error::CoreError;
use crate::money::Money;

/// Processor percentage fee in parts per thousand (2.9%).
pub const FEE_PER_MILLE: u128 = 29;

/// Processor fixed fee per charge, in cents.
pub const FEE_FIXED_CENTS: u64 = 30;

/// Integer division rounding half-up.
fn div_round_half_up(numerator: u128, denominator: u128) -> u128 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Gross charge amount for a desired net: `round2((net + 0.30) / (1 - 0.029))`.
///
/// A zero net still yields the rounded flat fee (0.31). Errors only when the
/// result would not fit in cents.
pub fn gross_for_net(net: Money) -> Result<Money, CoreError> {
    let keep = 1000 - FEE_PER_MILLE; // 971
    let numerator = (net.cents() as u128 + FEE_FIXED_CENTS as u128) * 1000;
    let gross = div_round_half_up(numerator, keep);
    u64::try_from(gross)
        .map(Money::from_cents)
        .map_err(|_| CoreError::InvalidAmount(format!("amount out of range: {net}")))
}

/// Net amount received after fees are deducted from a gross charge:
/// `round2(gross * (1 - 0.029)) - 0.30`, floored at zero.
pub fn net_for_gross(gross: Money) -> Money {
    let keep = 1000 - FEE_PER_MILLE;
    let kept = div_round_half_up(gross.cents() as u128 * keep, 1000);
    Money::from_cents((kept as u64).saturating_sub(FEE_FIXED_CENTS))
}
