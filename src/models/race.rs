use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable race card snapshot supplied by the facts provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceFacts {
    pub id: i64,
    pub race_date: DateTime<Utc>,
    pub track: String,
    /// Metres.
    pub distance: u32,
    pub race_type: String,
    #[serde(default)]
    pub class_rating: Option<i32>,
    #[serde(default)]
    pub total_runners: Option<i32>,
}

/// One runner on a race card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorseFacts {
    pub id: i64,
    pub race_id: i64,
    pub name: String,
    #[serde(default)]
    pub jockey: Option<String>,
    #[serde(default)]
    pub trainer: Option<String>,
    /// Decimal market odds.
    #[serde(default)]
    pub odds: Option<Decimal>,
    #[serde(default)]
    pub starting_position: Option<i32>,
    /// Kilograms.
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub last_race_days: Option<i32>,
    #[serde(default)]
    pub wins: Option<i32>,
    #[serde(default)]
    pub places: Option<i32>,
    #[serde(default)]
    pub starts: Option<i32>,
    #[serde(default)]
    pub avg_position: Option<Decimal>,
}

/// A race together with its runners, as read from a snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub race: RaceFacts,
    #[serde(default)]
    pub horses: Vec<HorseFacts>,
}
