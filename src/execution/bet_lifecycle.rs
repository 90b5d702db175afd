use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::models::{Bet, BetOutcome, BetStatus, BetTicket};

/// Open a PENDING bet. Only the ledger creates bets.
pub(crate) fn open(ticket: &BetTicket, stake: Decimal, placed_at: DateTime<Utc>) -> Bet {
    Bet {
        id: Uuid::new_v4(),
        race_id: ticket.race_id,
        horse_id: ticket.horse_id,
        stake,
        odds: ticket.odds,
        bet_type: ticket.bet_type,
        status: BetStatus::Pending,
        profit: None,
        placed_at,
        settled_at: None,
    }
}

/// Apply the single PENDING → WON / LOST transition.
///
/// `profit` and `status` change together. A WON bet takes `realized_profit`
/// (must not be negative); a LOST bet records `-stake` and ignores it.
/// Returns the recorded profit.
pub(crate) fn settle(
    bet: &mut Bet,
    outcome: BetOutcome,
    realized_profit: Decimal,
    settled_at: DateTime<Utc>,
) -> Result<Decimal, LedgerError> {
    if bet.status.is_terminal() {
        return Err(LedgerError::AlreadySettled {
            id: bet.id,
            status: bet.status,
        });
    }

    let profit = match outcome {
        BetOutcome::Won => {
            if realized_profit < Decimal::ZERO {
                return Err(LedgerError::InvalidOperation(format!(
                    "winning bet {} cannot realise a negative profit ({realized_profit})",
                    bet.id
                )));
            }
            realized_profit
        }
        BetOutcome::Lost => -bet.stake,
    };

    bet.status = outcome.into();
    bet.profit = Some(profit);
    bet.settled_at = Some(settled_at);

    Ok(profit)
}
