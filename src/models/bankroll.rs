use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Point-in-time view of an account's capital, as handed to the risk policy.
///
/// `daily_loss_to_date` / `weekly_loss_to_date` are settled losses only;
/// stakes committed but not yet settled are reported in `pending_exposure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollState {
    pub current_amount: Decimal,
    pub initial_amount: Decimal,
    /// Worst peak-to-trough decline seen, as a fraction of initial capital.
    pub max_drawdown: Decimal,
    /// Hard cap on daily exposure enforced by the ledger at commit time.
    pub daily_limit: Decimal,
    /// Hard cap on weekly exposure enforced by the ledger at commit time.
    pub weekly_limit: Decimal,
    pub daily_loss_to_date: Decimal,
    pub weekly_loss_to_date: Decimal,
    pub pending_exposure: Decimal,
}

impl BankrollState {
    /// A fresh account with no history.
    pub fn seeded(initial_amount: Decimal, daily_limit: Decimal, weekly_limit: Decimal) -> Self {
        Self {
            current_amount: initial_amount,
            initial_amount,
            max_drawdown: Decimal::ZERO,
            daily_limit,
            weekly_limit,
            daily_loss_to_date: Decimal::ZERO,
            weekly_loss_to_date: Decimal::ZERO,
            pending_exposure: Decimal::ZERO,
        }
    }

    /// Settled daily losses plus everything still at risk.
    pub fn daily_exposure(&self) -> Decimal {
        self.daily_loss_to_date + self.pending_exposure
    }

    /// Settled weekly losses plus everything still at risk.
    pub fn weekly_exposure(&self) -> Decimal {
        self.weekly_loss_to_date + self.pending_exposure
    }

    /// Capital not already tied up in pending bets.
    pub fn available(&self) -> Decimal {
        (self.current_amount - self.pending_exposure).max(Decimal::ZERO)
    }
}
