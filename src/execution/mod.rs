pub mod bankroll_ledger;
pub mod bet_lifecycle;
pub mod risk_policy;
pub mod stake_sizer;

pub use bankroll_ledger::{BankrollLedger, LedgerEvent};
pub use risk_policy::{evaluate, RiskParameters};
pub use stake_sizer::{size_stake, SizedStake};
