use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Candidate stake before the stop-loss and drawdown checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizedStake {
    /// Currency amount, truncated to whole pennies.
    pub amount: Decimal,
    /// Fraction of bankroll actually used.
    pub fraction: Decimal,
    /// True when the model asked for more than the policy maximum.
    pub capped: bool,
}

/// Size a stake: the model's suggested fraction, capped at `max_fraction`,
/// applied to the current bankroll.
pub fn size_stake(suggested_fraction: Decimal, max_fraction: Decimal, bankroll: Decimal) -> SizedStake {
    let suggested = suggested_fraction.max(Decimal::ZERO);
    let cap = max_fraction.max(Decimal::ZERO);
    let capped = suggested > cap;
    let fraction = suggested.min(cap);

    let raw = fraction * bankroll.max(Decimal::ZERO);

    // Clamp: never negative, never more than the bankroll
    let amount = raw
        .max(Decimal::ZERO)
        .min(bankroll.max(Decimal::ZERO))
        .round_dp_with_strategy(2, RoundingStrategy::ToZero);

    SizedStake {
        amount,
        fraction,
        capped,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
