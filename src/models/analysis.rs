use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ParseConfidence, RiskLabel};

/// Record emitted per analysed race for the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceAnalysisResult {
    pub race_id: i64,
    pub winner_prediction: String,
    /// Runner the prediction resolved to, if any.
    pub horse_id: Option<i64>,
    pub confidence_score: Decimal,
    pub analysis_reasoning: String,
    pub risk_assessment: RiskLabel,
    /// Model's proposed fraction of bankroll.
    pub stake_fraction: Decimal,
    /// Currency amount approved by the risk policy; zero when rejected.
    pub stake_recommendation: Decimal,
    pub expected_profit: Decimal,
    pub odds: Decimal,
    pub parse_confidence: ParseConfidence,
    /// Set when the model call failed or timed out.
    pub model_error: Option<String>,
    pub analysis_date: DateTime<Utc>,
}
