use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ParseConfidence, RiskLabel};

/// Typed view of one model answer. Built once by the parser, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrediction {
    pub winner_name: String,
    /// 0–100.
    pub confidence_score: Decimal,
    /// Model reasoning, or a parser diagnostic when the answer was unusable.
    pub reasoning: String,
    pub risk_label: RiskLabel,
    /// Fraction of bankroll proposed by the model, before policy caps.
    pub suggested_stake_fraction: Decimal,
    pub expected_profit: Decimal,
    pub implied_odds: Decimal,
    pub parse_confidence: ParseConfidence,
}

impl ParsedPrediction {
    pub const UNKNOWN_WINNER: &'static str = "Unknown";

    /// Sentinel returned when nothing could be recovered from the model output.
    pub fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            winner_name: Self::UNKNOWN_WINNER.to_string(),
            confidence_score: Decimal::from(50),
            reasoning: reasoning.into(),
            risk_label: RiskLabel::Unknown,
            suggested_stake_fraction: Decimal::ZERO,
            expected_profit: Decimal::ZERO,
            implied_odds: Decimal::ZERO,
            parse_confidence: ParseConfidence::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.parse_confidence == ParseConfidence::Fallback
    }
}
