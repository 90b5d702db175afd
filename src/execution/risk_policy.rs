use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{BankrollState, ParsedPrediction, RejectionReason, StakeDecision};

use super::stake_sizer;

/// Process-wide risk configuration. Read-only for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Minimum model confidence (0–100) to stake at all (default 70).
    pub confidence_threshold: Decimal,
    /// Max single stake as fraction of bankroll (default 5%).
    pub max_stake_percentage: Decimal,
    /// Carried with the parameter set; no check reads it yet.
    pub correlation_threshold: Decimal,
    /// Max losses plus open exposure per UTC day, in currency (default 100).
    pub stop_loss_daily: Decimal,
    /// Max losses plus open exposure per ISO week, in currency (default 300).
    pub stop_loss_weekly: Decimal,
    /// Drawdown ceiling as fraction of initial capital (default 25%).
    pub max_drawdown_pct: Decimal,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            confidence_threshold: Decimal::from(70),
            max_stake_percentage: Decimal::new(5, 2), // 0.05
            correlation_threshold: Decimal::new(7, 1), // 0.7
            stop_loss_daily: Decimal::from(100),
            stop_loss_weekly: Decimal::from(300),
            max_drawdown_pct: Decimal::new(25, 2), // 0.25
        }
    }
}

/// Turn a prediction into a stake decision. Pure; the first failing check wins.
///
/// 1. Unparseable prediction
/// 2. Confidence below threshold
/// 3. Sized stake (capped, never refused for size) is zero or exceeds free capital
/// 4. Daily stop-loss
/// 5. Weekly stop-loss
/// 6. Drawdown ceiling
///
/// Every boundary is inclusive: hitting a limit exactly passes.
pub fn evaluate(
    prediction: &ParsedPrediction,
    bankroll: &BankrollState,
    params: &RiskParameters,
) -> StakeDecision {
    // 1. Fallback predictions never stake
    if prediction.is_fallback() {
        return StakeDecision::reject(RejectionReason::UnparseableInput);
    }

    // 2. Confidence
    if prediction.confidence_score < params.confidence_threshold {
        return StakeDecision::reject(RejectionReason::LowConfidence);
    }

    // 3. Size, capping at max_stake_percentage
    let sized = stake_sizer::size_stake(
        prediction.suggested_stake_fraction,
        params.max_stake_percentage,
        bankroll.current_amount,
    );
    let stake = sized.amount;

    if sized.capped {
        tracing::debug!(
            suggested = %prediction.suggested_stake_fraction,
            fraction = %sized.fraction,
            stake = %stake,
            "Stake fraction capped at max_stake_percentage"
        );
    }

    if stake <= Decimal::ZERO || stake > bankroll.available() {
        return StakeDecision::reject(RejectionReason::BankrollLimit);
    }

    // 4. Daily stop-loss, counting unsettled exposure
    if bankroll.daily_exposure() + stake > params.stop_loss_daily {
        return StakeDecision::reject(RejectionReason::DailyStoploss);
    }

    // 5. Weekly stop-loss
    if bankroll.weekly_exposure() + stake > params.stop_loss_weekly {
        return StakeDecision::reject(RejectionReason::WeeklyStoploss);
    }

    // 6. Drawdown ceiling
    if bankroll.max_drawdown > params.max_drawdown_pct {
        return StakeDecision::reject(RejectionReason::DrawdownLimit);
    }

    StakeDecision::approve(stake)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
