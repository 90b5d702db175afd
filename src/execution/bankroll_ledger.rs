use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use metrics::{counter, gauge};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::models::{
    BankrollState, Bet, BetOutcome, BetStatus, BetTicket, ParsedPrediction, StakeDecision,
};

use super::bet_lifecycle;
use super::risk_policy::{self, RiskParameters};

/// Change notifications for whoever persists ledger records.
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    BetCommitted(Bet),
    BetSettled { bet: Bet, bankroll: BankrollState },
}

/// Single writer of one account's bankroll.
///
/// Stakes are committed as PENDING bets without moving cash ("pay on loss");
/// their stakes count as open exposure against the stop-loss windows until
/// settlement. Commit and settle run under one lock so concurrent commits
/// never both pass a check against the same stale exposure.
#[derive(Clone)]
pub struct BankrollLedger {
    inner: Arc<Mutex<LedgerInner>>,
    events: Option<broadcast::Sender<LedgerEvent>>,
}

struct LedgerInner {
    current_amount: Decimal,
    initial_amount: Decimal,
    /// High-water mark for drawdown.
    peak_amount: Decimal,
    max_drawdown: Decimal,
    daily_limit: Decimal,
    weekly_limit: Decimal,
    bets: HashMap<Uuid, Bet>,
    losses: Vec<SettledLoss>,
}

struct SettledLoss {
    at: DateTime<Utc>,
    amount: Decimal,
}

impl BankrollLedger {
    /// Create a ledger seeded with initial capital and the account's hard
    /// daily/weekly exposure caps.
    pub fn new(initial_amount: Decimal, daily_limit: Decimal, weekly_limit: Decimal) -> Self {
        let initial_amount = initial_amount.max(Decimal::ZERO);
        Self {
            inner: Arc::new(Mutex::new(LedgerInner {
                current_amount: initial_amount,
                initial_amount,
                peak_amount: initial_amount,
                max_drawdown: Decimal::ZERO,
                daily_limit,
                weekly_limit,
                bets: HashMap::new(),
                losses: Vec::new(),
            })),
            events: None,
        }
    }

    /// Publish commits and settlements on `tx`.
    pub fn with_events(mut self, tx: broadcast::Sender<LedgerEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub async fn snapshot(&self) -> BankrollState {
        self.snapshot_at(Utc::now()).await
    }

    /// State with loss windows evaluated as of `now`.
    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> BankrollState {
        self.inner.lock().await.snapshot(now)
    }

    pub async fn bet(&self, bet_id: &Uuid) -> Option<Bet> {
        self.inner.lock().await.bets.get(bet_id).cloned()
    }

    pub async fn pending_bets(&self) -> Vec<Bet> {
        let inner = self.inner.lock().await;
        let mut pending: Vec<Bet> = inner
            .bets
            .values()
            .filter(|b| b.status == BetStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|b| b.placed_at);
        pending
    }

    /// Commit an approved decision as a PENDING bet.
    pub async fn commit_stake(
        &self,
        decision: &StakeDecision,
        ticket: &BetTicket,
    ) -> Result<Bet, LedgerError> {
        self.commit_stake_at(decision, ticket, Utc::now()).await
    }

    pub async fn commit_stake_at(
        &self,
        decision: &StakeDecision,
        ticket: &BetTicket,
        now: DateTime<Utc>,
    ) -> Result<Bet, LedgerError> {
        let mut inner = self.inner.lock().await;
        let bet = inner.commit(decision, ticket, now)?;
        self.publish(LedgerEvent::BetCommitted(bet.clone()));
        Ok(bet)
    }

    /// Evaluate the risk policy against the live state and commit when
    /// approved, all inside the critical section.
    pub async fn evaluate_and_commit(
        &self,
        prediction: &ParsedPrediction,
        params: &RiskParameters,
        ticket: &BetTicket,
    ) -> Result<(StakeDecision, Option<Bet>), LedgerError> {
        self.evaluate_and_commit_at(prediction, params, ticket, Utc::now())
            .await
    }

    pub async fn evaluate_and_commit_at(
        &self,
        prediction: &ParsedPrediction,
        params: &RiskParameters,
        ticket: &BetTicket,
        now: DateTime<Utc>,
    ) -> Result<(StakeDecision, Option<Bet>), LedgerError> {
        let mut inner = self.inner.lock().await;
        let decision = risk_policy::evaluate(prediction, &inner.snapshot(now), params);

        if !decision.approved {
            return Ok((decision, None));
        }

        let bet = inner.commit(&decision, ticket, now)?;
        self.publish(LedgerEvent::BetCommitted(bet.clone()));
        Ok((decision, Some(bet)))
    }

    /// Settle a PENDING bet and apply its effect to the bankroll. A repeat
    /// call reports `AlreadySettled` and changes nothing.
    pub async fn settle_bet(
        &self,
        bet_id: Uuid,
        outcome: BetOutcome,
        realized_profit: Decimal,
    ) -> Result<BankrollState, LedgerError> {
        self.settle_bet_at(bet_id, outcome, realized_profit, Utc::now())
            .await
    }

    pub async fn settle_bet_at(
        &self,
        bet_id: Uuid,
        outcome: BetOutcome,
        realized_profit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<BankrollState, LedgerError> {
        let mut inner = self.inner.lock().await;
        let (bet, state) = inner.settle(bet_id, outcome, realized_profit, now)?;
        self.publish(LedgerEvent::BetSettled {
            bet,
            bankroll: state.clone(),
        });
        Ok(state)
    }

    fn publish(&self, event: LedgerEvent) {
        if let Some(tx) = &self.events {
            // No subscribers is fine
            let _ = tx.send(event);
        }
    }
}

impl LedgerInner {
    fn pending_exposure(&self) -> Decimal {
        self.bets
            .values()
            .filter(|b| b.status == BetStatus::Pending)
            .map(|b| b.stake)
            .sum()
    }

    fn losses_since(&self, since: DateTime<Utc>) -> Decimal {
        self.losses
            .iter()
            .filter(|l| l.at >= since)
            .map(|l| l.amount)
            .sum()
    }

    fn snapshot(&self, now: DateTime<Utc>) -> BankrollState {
        BankrollState {
            current_amount: self.current_amount,
            initial_amount: self.initial_amount,
            max_drawdown: self.max_drawdown,
            daily_limit: self.daily_limit,
            weekly_limit: self.weekly_limit,
            daily_loss_to_date: self.losses_since(start_of_day(now)),
            weekly_loss_to_date: self.losses_since(start_of_week(now)),
            pending_exposure: self.pending_exposure(),
        }
    }

    fn commit(
        &mut self,
        decision: &StakeDecision,
        ticket: &BetTicket,
        now: DateTime<Utc>,
    ) -> Result<Bet, LedgerError> {
        if !decision.approved {
            let reason = decision
                .rejection_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unspecified".into());
            return Err(LedgerError::InvalidOperation(format!(
                "cannot commit a rejected stake decision ({reason})"
            )));
        }
        if decision.stake_amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidOperation(format!(
                "stake must be positive, got {}",
                decision.stake_amount
            )));
        }
        if ticket.odds <= Decimal::ZERO {
            return Err(LedgerError::InvalidOperation(format!(
                "odds must be positive, got {}",
                ticket.odds
            )));
        }

        let stake = decision.stake_amount;
        let state = self.snapshot(now);

        let committed = state.pending_exposure + stake;
        if committed > state.current_amount {
            return Err(LedgerError::ExposureLimit {
                window: "capital",
                exposure: committed,
                limit: state.current_amount,
            });
        }
        if state.daily_exposure() + stake > self.daily_limit {
            return Err(LedgerError::ExposureLimit {
                window: "daily",
                exposure: state.daily_exposure() + stake,
                limit: self.daily_limit,
            });
        }
        if state.weekly_exposure() + stake > self.weekly_limit {
            return Err(LedgerError::ExposureLimit {
                window: "weekly",
                exposure: state.weekly_exposure() + stake,
                limit: self.weekly_limit,
            });
        }

        let bet = bet_lifecycle::open(ticket, stake, now);
        self.bets.insert(bet.id, bet.clone());

        counter!("bets_committed_total").increment(1);
        tracing::info!(
            bet_id = %bet.id,
            race_id = bet.race_id,
            horse_id = bet.horse_id,
            stake = %stake,
            odds = %bet.odds,
            bet_type = %bet.bet_type,
            pending_exposure = %committed,
            "Ledger: stake committed"
        );

        Ok(bet)
    }

    fn settle(
        &mut self,
        bet_id: Uuid,
        outcome: BetOutcome,
        realized_profit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(Bet, BankrollState), LedgerError> {
        let current = self.bets.get(&bet_id).ok_or(LedgerError::NotFound(bet_id))?;
        if current.status.is_terminal() {
            return Err(LedgerError::AlreadySettled {
                id: bet_id,
                status: current.status,
            });
        }
        let stake = current.stake;

        // Work out the new figures before touching the bet so an overflow
        // leaves it PENDING.
        let overflow = || {
            LedgerError::InvalidOperation(format!("settling bet {bet_id} overflows the bankroll"))
        };
        let (attempted, drawdown) = match outcome {
            BetOutcome::Won => (
                self.current_amount
                    .checked_add(realized_profit.max(Decimal::ZERO))
                    .ok_or_else(overflow)?,
                None,
            ),
            BetOutcome::Lost => {
                let attempted = self
                    .current_amount
                    .checked_sub(stake)
                    .ok_or_else(overflow)?;
                // Unclamped figure, so lost capital is still recorded
                let drawdown = if self.initial_amount > Decimal::ZERO {
                    let drop = self.peak_amount.checked_sub(attempted).ok_or_else(overflow)?;
                    Some(drop.checked_div(self.initial_amount).ok_or_else(overflow)?)
                } else {
                    None
                };
                (attempted, drawdown)
            }
        };

        let bet = self
            .bets
            .get_mut(&bet_id)
            .ok_or(LedgerError::NotFound(bet_id))?;
        let profit = bet_lifecycle::settle(bet, outcome, realized_profit, now)?;
        let settled = bet.clone();

        match outcome {
            BetOutcome::Won => {
                self.current_amount = attempted;
                self.peak_amount = self.peak_amount.max(self.current_amount);
            }
            BetOutcome::Lost => {
                if attempted < Decimal::ZERO {
                    tracing::warn!(
                        bet_id = %bet_id,
                        attempted = %attempted,
                        "Ledger: loss exceeds capital, clamping bankroll to zero"
                    );
                }
                self.current_amount = attempted.max(Decimal::ZERO);
                self.losses.push(SettledLoss {
                    at: now,
                    amount: settled.stake,
                });
            }
        }
        if let Some(drawdown) = drawdown {
            self.max_drawdown = self.max_drawdown.max(drawdown);
        }

        // Losses before this ISO week can no longer reach any window
        let week_start = start_of_week(now);
        self.losses.retain(|l| l.at >= week_start);

        let state = self.snapshot(now);

        counter!("bets_settled_total", "status" => settled.status.to_string()).increment(1);
        gauge!("bankroll_current_amount").set(state.current_amount.to_f64().unwrap_or(0.0));
        tracing::info!(
            bet_id = %bet_id,
            status = %settled.status,
            profit = %profit,
            current_amount = %state.current_amount,
            max_drawdown = %state.max_drawdown,
            "Ledger: bet settled"
        );

        Ok((settled, state))
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(now)
}

/// Monday 00:00 UTC of the ISO week containing `now`.
fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(now) - Duration::days(i64::from(now.weekday().num_days_from_monday()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
