pub mod analysis;
pub mod bankroll;
pub mod bet;
pub mod decision;
pub mod prediction;
pub mod race;

pub use analysis::RaceAnalysisResult;
pub use bankroll::BankrollState;
pub use bet::{Bet, BetTicket};
pub use decision::{RejectionReason, StakeDecision};
pub use prediction::ParsedPrediction;
pub use race::{HorseFacts, RaceFacts, RaceSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// RiskLabel
// ---------------------------------------------------------------------------

/// Model's own risk assessment of its pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLabel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLabel {
    /// Lenient match on the leading word, so "Medium - soft ground" is Medium.
    pub fn from_model_str(s: &str) -> Self {
        let head = s
            .trim()
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|w| !w.is_empty())
            .unwrap_or("")
            .to_uppercase();

        match head.as_str() {
            "LOW" => RiskLabel::Low,
            "MEDIUM" | "MODERATE" => RiskLabel::Medium,
            "HIGH" => RiskLabel::High,
            _ => RiskLabel::Unknown,
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::Low => write!(f, "LOW"),
            RiskLabel::Medium => write!(f, "MEDIUM"),
            RiskLabel::High => write!(f, "HIGH"),
            RiskLabel::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// ParseConfidence
// ---------------------------------------------------------------------------

/// How much of a prediction came from the model versus defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParseConfidence {
    /// Structured answer with every numeric field present.
    Full,
    /// Structured answer with defaults filled in, or a lexically extracted winner.
    Partial,
    /// Nothing usable; sentinel prediction.
    Fallback,
}

impl ParseConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseConfidence::Full => "full",
            ParseConfidence::Partial => "partial",
            ParseConfidence::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ParseConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BetType / BetStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetType {
    Win,
    Place,
    EachWay,
}

impl BetType {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "WIN" => Some(BetType::Win),
            "PLACE" => Some(BetType::Place),
            "EACH_WAY" | "EW" => Some(BetType::EachWay),
            _ => None,
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetType::Win => write!(f, "WIN"),
            BetType::Place => write!(f, "PLACE"),
            BetType::EachWay => write!(f, "EACH_WAY"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
}

impl BetStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BetStatus::Pending)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetStatus::Pending => write!(f, "PENDING"),
            BetStatus::Won => write!(f, "WON"),
            BetStatus::Lost => write!(f, "LOST"),
        }
    }
}

/// Settlement result reported by the race result feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BetOutcome {
    Won,
    Lost,
}

impl From<BetOutcome> for BetStatus {
    fn from(outcome: BetOutcome) -> Self {
        match outcome {
            BetOutcome::Won => BetStatus::Won,
            BetOutcome::Lost => BetStatus::Lost,
        }
    }
}

impl fmt::Display for BetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        BetStatus::from(*self).fmt(f)
    }
}
