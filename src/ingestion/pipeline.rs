use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::analysis::{parse_prediction, resolve_runner};
use crate::errors::{LedgerError, ModelError};
use crate::execution::{self, BankrollLedger, RiskParameters};
use crate::llm::{format_race_prompt, ModelCaller};
use crate::models::{
    BankrollState, Bet, BetTicket, BetType, HorseFacts, ParseConfidence, ParsedPrediction,
    RaceAnalysisResult, RaceFacts, StakeDecision,
};

/// Everything one race analysis produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub analysis: RaceAnalysisResult,
    pub prediction: ParsedPrediction,
    /// None only when the race has no runners to stake on.
    pub decision: Option<StakeDecision>,
    /// Present when the decision is approved and the pick resolved to a
    /// runner with known odds.
    pub ticket: Option<BetTicket>,
}

/// Compose parser, runner resolution and risk policy over one model response.
///
/// A failed model call is treated exactly like an empty response: it takes
/// the fallback path and is rejected by the policy, never skipped.
pub fn run(
    race: &RaceFacts,
    horses: &[HorseFacts],
    model_response: Result<String, ModelError>,
    bankroll: &BankrollState,
    params: &RiskParameters,
    bet_type: BetType,
) -> PipelineOutput {
    let runners: Vec<HorseFacts> = horses
        .iter()
        .filter(|h| {
            let belongs = h.race_id == race.id;
            if !belongs {
                tracing::warn!(
                    race_id = race.id,
                    horse_id = h.id,
                    horse_race_id = h.race_id,
                    "Runner belongs to another race, ignoring"
                );
            }
            belongs
        })
        .cloned()
        .collect();

    // Step 1: Model response, failures become empty text
    let (raw_text, model_error) = match model_response {
        Ok(text) => (text, None),
        Err(e) => {
            tracing::warn!(race_id = race.id, error = %e, "Model call failed, using fallback prediction");
            counter!("model_call_failures_total").increment(1);
            (String::new(), Some(e.to_string()))
        }
    };

    // Step 2: Parse
    let prediction = parse_prediction(&raw_text);
    counter!("predictions_parsed_total", "confidence" => prediction.parse_confidence.as_str())
        .increment(1);

    if prediction.parse_confidence != ParseConfidence::Full {
        tracing::warn!(
            race_id = race.id,
            parse_confidence = %prediction.parse_confidence,
            winner = %prediction.winner_name,
            reasoning = %prediction.reasoning,
            "Model response only partly parsed"
        );
    }

    // Step 3: Resolve the pick to a runner
    let runner = if prediction.is_fallback() {
        None
    } else {
        resolve_runner(&prediction.winner_name, &runners)
    };

    if runner.is_none() && !prediction.is_fallback() {
        tracing::warn!(
            race_id = race.id,
            winner = %prediction.winner_name,
            "Predicted winner does not match any runner"
        );
    }

    // Step 4: Risk policy
    let decision = if runners.is_empty() {
        tracing::warn!(race_id = race.id, "Race has no runners, no stake decision");
        None
    } else {
        Some(execution::evaluate(&prediction, bankroll, params))
    };

    if let Some(d) = &decision {
        match d.rejection_reason {
            None => {
                counter!("stake_decisions_total", "outcome" => "approved", "reason" => "none")
                    .increment(1);
                tracing::info!(
                    race_id = race.id,
                    winner = %prediction.winner_name,
                    confidence = %prediction.confidence_score,
                    stake = %d.stake_amount,
                    "Stake approved"
                );
            }
            Some(reason) => {
                counter!("stake_decisions_total", "outcome" => "rejected", "reason" => reason.as_str())
                    .increment(1);
                tracing::warn!(
                    race_id = race.id,
                    winner = %prediction.winner_name,
                    confidence = %prediction.confidence_score,
                    reason = %reason,
                    "Stake rejected"
                );
            }
        }
    }

    // Step 5: Ticket for an approved stake
    let odds = runner
        .and_then(|h| h.odds)
        .filter(|o| *o > Decimal::ZERO)
        .unwrap_or(prediction.implied_odds);

    let ticket = match (&decision, runner) {
        (Some(d), Some(horse)) if d.approved && odds > Decimal::ZERO => Some(BetTicket {
            race_id: race.id,
            horse_id: horse.id,
            odds,
            bet_type,
        }),
        (Some(d), _) if d.approved => {
            tracing::warn!(
                race_id = race.id,
                winner = %prediction.winner_name,
                "Approved stake has no bettable runner or odds"
            );
            None
        }
        _ => None,
    };

    let stake_recommendation = decision
        .as_ref()
        .map(|d| d.stake_amount)
        .unwrap_or(Decimal::ZERO);

    let analysis = RaceAnalysisResult {
        race_id: race.id,
        winner_prediction: prediction.winner_name.clone(),
        horse_id: runner.map(|h| h.id),
        confidence_score: prediction.confidence_score,
        analysis_reasoning: prediction.reasoning.clone(),
        risk_assessment: prediction.risk_label,
        stake_fraction: prediction.suggested_stake_fraction,
        stake_recommendation,
        expected_profit: prediction.expected_profit,
        odds,
        parse_confidence: prediction.parse_confidence,
        model_error,
        analysis_date: Utc::now(),
    };

    PipelineOutput {
        analysis,
        prediction,
        decision,
        ticket,
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Caller-imposed limit on the model call; expiry counts as a failed call.
    pub model_timeout: Duration,
    pub bet_type: BetType,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(30),
            bet_type: BetType::Win,
        }
    }
}

/// Drives one race at a time: model call, analysis against a ledger
/// snapshot, and optional commitment.
pub struct AnalysisPipeline<M> {
    model: M,
    ledger: BankrollLedger,
    params: RwLock<Arc<RiskParameters>>,
    config: PipelineConfig,
}

impl<M: ModelCaller> AnalysisPipeline<M> {
    pub fn new(model: M, ledger: BankrollLedger, params: RiskParameters, config: PipelineConfig) -> Self {
        Self {
            model,
            ledger,
            params: RwLock::new(Arc::new(params)),
            config,
        }
    }

    pub fn ledger(&self) -> &BankrollLedger {
        &self.ledger
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub async fn params(&self) -> Arc<RiskParameters> {
        self.params.read().await.clone()
    }

    /// Install new risk parameters. Runs already in flight keep the set they
    /// started with.
    pub async fn swap_params(&self, params: RiskParameters) {
        *self.params.write().await = Arc::new(params);
        tracing::info!("Risk parameters replaced");
    }

    /// Analyse one race. Never fails: model errors and timeouts degrade to
    /// the fallback prediction.
    pub async fn analyze_race(&self, race: &RaceFacts, horses: &[HorseFacts]) -> PipelineOutput {
        let start = Instant::now();
        let params = self.params().await;

        let runners: Vec<HorseFacts> = horses
            .iter()
            .filter(|h| h.race_id == race.id)
            .cloned()
            .collect();

        let model_response = if runners.is_empty() {
            Ok(String::new())
        } else {
            let prompt = format_race_prompt(race, &runners);
            match tokio::time::timeout(self.config.model_timeout, self.model.call_model(&prompt)).await {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout(self.config.model_timeout)),
            }
        };

        let bankroll = self.ledger.snapshot().await;
        let output = run(
            race,
            horses,
            model_response,
            &bankroll,
            &params,
            self.config.bet_type,
        );

        histogram!("pipeline_latency_seconds").record(start.elapsed().as_secs_f64());
        output
    }

    /// Commit the analysed stake. The policy is re-run inside the ledger's
    /// critical section, so a decision made against a stale snapshot is
    /// dropped rather than stacked past the stop-loss.
    pub async fn place_bet(&self, output: &PipelineOutput) -> Result<Option<Bet>, LedgerError> {
        let Some(ticket) = &output.ticket else {
            return Ok(None);
        };

        let params = self.params().await;
        let (decision, bet) = self
            .ledger
            .evaluate_and_commit(&output.prediction, &params, ticket)
            .await?;

        if let Some(reason) = decision.rejection_reason {
            tracing::warn!(
                race_id = ticket.race_id,
                reason = %reason,
                "Stake no longer passes risk policy at commit time"
            );
        }

        Ok(bet)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RejectionReason;
    use chrono::TimeZone;

    fn race() -> RaceFacts {
        RaceFacts {
            id: 10,
            race_date: Utc.with_ymd_and_hms(2026, 10, 18, 15, 0, 0).unwrap(),
            track: "Ayr".into(),
            distance: 1600,
            race_type: "Flat".into(),
            class_rating: Some(7),
            total_runners: None,
        }
    }

    fn horse(id: i64, name: &str, odds: Option<Decimal>) -> HorseFacts {
        HorseFacts {
            id,
            race_id: 10,
            name: name.into(),
            jockey: None,
            trainer: None,
            odds,
            starting_position: None,
            weight: None,
            last_race_days: None,
            wins: None,
            places: None,
            starts: None,
            avg_position: None,
        }
    }

    fn horses() -> Vec<HorseFacts> {
        vec![
            horse(1, "Golden Eagle", Some(Decimal::new(35, 1))),
            horse(2, "Silver Streak", None),
        ]
    }

    fn bankroll() -> BankrollState {
        BankrollState::seeded(Decimal::from(1_000), Decimal::from(100), Decimal::from(300))
    }

    #[test]
    fn test_approved_pick_gets_ticket_at_market_odds() {
        let text = r#"{"winner": "Golden Eagle", "confidence": 90, "reasoning": "Form", "risk": "LOW",
            "stake": 0.2, "profit": 100, "odds": 4.0}"#;
        let out = run(&race(), &horses(), Ok(text.into()), &bankroll(), &RiskParameters::default(), BetType::Win);

        let decision = out.decision.unwrap();
        assert!(decision.approved);
        assert_eq!(decision.stake_amount, Decimal::from(50));

        let ticket = out.ticket.unwrap();
        assert_eq!(ticket.horse_id, 1);
        assert_eq!(ticket.odds, Decimal::new(35, 1)); // runner's odds beat the model's

        assert_eq!(out.analysis.stake_recommendation, Decimal::from(50));
        assert_eq!(out.analysis.stake_fraction, Decimal::new(2, 1));
        assert_eq!(out.analysis.horse_id, Some(1));
    }

    #[test]
    fn test_model_odds_used_when_runner_has_none() {
        let text = r#"{"winner": "Silver Streak", "confidence": 90, "stake": 0.05, "profit": 10, "odds": 2.5}"#;
        let out = run(&race(), &horses(), Ok(text.into()), &bankroll(), &RiskParameters::default(), BetType::Place);

        let ticket = out.ticket.unwrap();
        assert_eq!(ticket.horse_id, 2);
        assert_eq!(ticket.odds, Decimal::new(25, 1));
        assert_eq!(ticket.bet_type, BetType::Place);
    }

    #[test]
    fn test_model_failure_routes_through_fallback() {
        let out = run(
            &race(),
            &horses(),
            Err(ModelError::Timeout(Duration::from_secs(30))),
            &bankroll(),
            &RiskParameters::default(),
            BetType::Win,
        );

        assert_eq!(out.analysis.parse_confidence, ParseConfidence::Fallback);
        assert!(out.analysis.model_error.unwrap().contains("timed out"));
        let decision = out.decision.unwrap();
        assert_eq!(decision.rejection_reason, Some(RejectionReason::UnparseableInput));
        assert_eq!(out.analysis.stake_recommendation, Decimal::ZERO);
        assert!(out.ticket.is_none());
    }

    #[test]
    fn test_unmatched_winner_has_decision_but_no_ticket() {
        let text = r#"{"winner": "Phantom Runner", "confidence": 90, "stake": 0.05, "profit": 10, "odds": 2.5}"#;
        let out = run(&race(), &horses(), Ok(text.into()), &bankroll(), &RiskParameters::default(), BetType::Win);

        assert!(out.decision.unwrap().approved);
        assert!(out.ticket.is_none());
        assert_eq!(out.analysis.horse_id, None);
    }

    #[test]
    fn test_no_runners_means_no_decision() {
        let foreign = vec![HorseFacts {
            race_id: 99,
            ..horse(5, "Golden Eagle", Some(Decimal::from(3)))
        }];
        let text = r#"{"winner": "Golden Eagle", "confidence": 90, "stake": 0.05, "profit": 10, "odds": 3}"#;
        let out = run(&race(), &foreign, Ok(text.into()), &bankroll(), &RiskParameters::default(), BetType::Win);

        assert!(out.decision.is_none());
        assert!(out.ticket.is_none());
        assert_eq!(out.analysis.stake_recommendation, Decimal::ZERO);
    }

    #[test]
    fn test_rejected_decision_has_no_ticket() {
        let text = r#"{"winner": "Golden Eagle", "confidence": 60, "stake": 0.05, "profit": 10, "odds": 3}"#;
        let out = run(&race(), &horses(), Ok(text.into()), &bankroll(), &RiskParameters::default(), BetType::Win);

        assert_eq!(out.decision.unwrap().rejection_reason, Some(RejectionReason::LowConfidence));
        assert!(out.ticket.is_none());
        assert_eq!(out.analysis.horse_id, Some(1));
    }
}
