use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First failing risk check, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    UnparseableInput,
    LowConfidence,
    BankrollLimit,
    DailyStoploss,
    WeeklyStoploss,
    DrawdownLimit,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::UnparseableInput => "unparseable_input",
            RejectionReason::LowConfidence => "low_confidence",
            RejectionReason::BankrollLimit => "bankroll_limit",
            RejectionReason::DailyStoploss => "daily_stoploss",
            RejectionReason::WeeklyStoploss => "weekly_stoploss",
            RejectionReason::DrawdownLimit => "drawdown_limit",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one risk evaluation. A rejection always carries a zero stake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeDecision {
    pub approved: bool,
    pub stake_amount: Decimal,
    pub rejection_reason: Option<RejectionReason>,
}

impl StakeDecision {
    pub fn approve(stake_amount: Decimal) -> Self {
        Self {
            approved: true,
            stake_amount,
            rejection_reason: None,
        }
    }

    pub fn reject(reason: RejectionReason) -> Self {
        Self {
            approved: false,
            stake_amount: Decimal::ZERO,
            rejection_reason: Some(reason),
        }
    }
}
