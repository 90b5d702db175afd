use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BetStatus, BetType};

/// A committed bet. Created PENDING by the ledger and settled exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub race_id: i64,
    pub horse_id: i64,
    pub stake: Decimal,
    pub odds: Decimal,
    pub bet_type: BetType,
    pub status: BetStatus,
    /// Absent while PENDING; set by the settling transition.
    pub profit: Option<Decimal>,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// What to bet on, resolved from the prediction and the race card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetTicket {
    pub race_id: i64,
    pub horse_id: i64,
    pub odds: Decimal,
    pub bet_type: BetType,
}
