mod common;

use std::time::Duration;

use rust_decimal::Decimal;

use common::{field, horse, pipeline, race, Script, ScriptedModel, RACE_ID};
use racebot::execution::RiskParameters;
use racebot::models::{BetStatus, HorseFacts, ParseConfidence, RejectionReason, RiskLabel};

const GOLDEN_EAGLE_JSON: &str = r#"Here is my analysis.
```json
{"winner": "Golden Eagle", "confidence": 85, "reasoning": "Best recent form over the trip",
 "risk": "LOW", "stake": 0.05, "profit": 125, "odds": 3.5}
```
Good luck!"#;

#[tokio::test]
async fn test_json_answer_is_approved_and_committed() {
    let pipeline = pipeline(ScriptedModel::replying(GOLDEN_EAGLE_JSON));

    let output = pipeline.analyze_race(&race(), &field()).await;

    assert_eq!(output.analysis.parse_confidence, ParseConfidence::Full);
    assert_eq!(output.analysis.winner_prediction, "Golden Eagle");
    assert_eq!(output.analysis.horse_id, Some(1));
    assert_eq!(output.analysis.risk_assessment, RiskLabel::Low);
    assert!(output.analysis.model_error.is_none());

    let decision = output.decision.clone().expect("race has runners");
    assert!(decision.approved);
    assert_eq!(decision.stake_amount, Decimal::from(50));

    let ticket = output.ticket.clone().expect("approved pick has a ticket");
    assert_eq!(ticket.odds, Decimal::new(35, 1));

    let bet = pipeline
        .place_bet(&output)
        .await
        .expect("Commit should succeed")
        .expect("Stake should still pass policy");
    assert_eq!(bet.status, BetStatus::Pending);
    assert_eq!(bet.stake, Decimal::from(50));
    assert_eq!(bet.horse_id, 1);

    let state = pipeline.ledger().snapshot().await;
    assert_eq!(state.current_amount, Decimal::from(1_000));
    assert_eq!(state.pending_exposure, Decimal::from(50));
}

#[tokio::test]
async fn test_prompt_lists_every_runner() {
    let pipeline = pipeline(ScriptedModel::replying(GOLDEN_EAGLE_JSON));
    pipeline.analyze_race(&race(), &field()).await;

    let prompts = pipeline.model().prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    for name in ["Golden Eagle", "Silver Streak", "Night Owl", "Newmarket"] {
        assert!(prompts[0].contains(name), "prompt missing {name}");
    }
}

#[tokio::test]
async fn test_prose_answer_takes_lexical_path() {
    let pipeline = pipeline(ScriptedModel::replying(
        "Looking at the going, the winner is Silver Streak, who handles soft ground well.",
    ));

    let output = pipeline.analyze_race(&race(), &field()).await;

    assert_eq!(output.analysis.parse_confidence, ParseConfidence::Partial);
    assert_eq!(output.analysis.winner_prediction, "Silver Streak");
    assert_eq!(output.analysis.horse_id, Some(2));
    // Lexical path defaults confidence to 75, above the 70 threshold
    assert_eq!(output.analysis.confidence_score, Decimal::from(75));
    assert!(output.decision.unwrap().approved);
    assert_eq!(output.ticket.unwrap().odds, Decimal::from(5));
}

#[tokio::test]
async fn test_unparseable_answer_is_rejected_not_skipped() {
    let pipeline = pipeline(ScriptedModel::replying("I cannot separate these horses today."));

    let output = pipeline.analyze_race(&race(), &field()).await;

    assert_eq!(output.analysis.parse_confidence, ParseConfidence::Fallback);
    assert_eq!(output.analysis.winner_prediction, "Unknown");
    assert_eq!(output.analysis.stake_recommendation, Decimal::ZERO);
    assert_eq!(
        output.decision.clone().unwrap().rejection_reason,
        Some(RejectionReason::UnparseableInput)
    );
    assert!(pipeline.place_bet(&output).await.unwrap().is_none());
    assert_eq!(pipeline.ledger().pending_bets().await.len(), 0);
}

#[tokio::test]
async fn test_model_error_degrades_to_fallback() {
    let pipeline = pipeline(ScriptedModel::new(Script::Fail));

    let output = pipeline.analyze_race(&race(), &field()).await;

    assert_eq!(output.analysis.parse_confidence, ParseConfidence::Fallback);
    let error = output.analysis.model_error.expect("model error recorded");
    assert!(error.contains("529"));
    assert_eq!(
        output.decision.unwrap().rejection_reason,
        Some(RejectionReason::UnparseableInput)
    );
}

#[tokio::test]
async fn test_model_timeout_degrades_to_fallback() {
    let pipeline = pipeline(ScriptedModel::new(Script::Hang(Duration::from_secs(5))));

    let output = pipeline.analyze_race(&race(), &field()).await;

    assert_eq!(output.analysis.parse_confidence, ParseConfidence::Fallback);
    assert!(output.analysis.model_error.unwrap().contains("timed out"));
    assert!(!output.decision.unwrap().approved);
}

#[tokio::test]
async fn test_stake_recommendation_is_currency_amount() {
    let pipeline = pipeline(ScriptedModel::replying(
        r#"{"winner": "Golden Eagle", "confidence": 90, "reasoning": "r", "risk": "MEDIUM",
            "stake": 0.02, "profit": 40, "odds": 3.5}"#,
    ));

    let output = pipeline.analyze_race(&race(), &field()).await;

    // 2% of 1000, not a fraction scaled by 1000
    assert_eq!(output.analysis.stake_fraction, Decimal::new(2, 2));
    assert_eq!(output.analysis.stake_recommendation, Decimal::from(20));
}

#[tokio::test]
async fn test_pending_exposure_counts_toward_daily_stoploss() {
    let pipeline = pipeline(ScriptedModel::replying(GOLDEN_EAGLE_JSON));

    for _ in 0..2 {
        let output = pipeline.analyze_race(&race(), &field()).await;
        assert!(pipeline.place_bet(&output).await.unwrap().is_some());
    }

    // 100 already open against a 100 daily stop-loss
    let output = pipeline.analyze_race(&race(), &field()).await;
    assert_eq!(
        output.decision.unwrap().rejection_reason,
        Some(RejectionReason::DailyStoploss)
    );
    assert!(output.ticket.is_none());
}

#[tokio::test]
async fn test_stale_approval_is_dropped_at_commit() {
    let pipeline = pipeline(ScriptedModel::replying(
        r#"{"winner": "Golden Eagle", "confidence": 85, "reasoning": "r", "risk": "LOW",
            "stake": 0.08, "profit": 200, "odds": 3.5}"#,
    ));
    pipeline
        .swap_params(RiskParameters {
            max_stake_percentage: Decimal::new(8, 2),
            ..RiskParameters::default()
        })
        .await;

    // Both analysed against an empty ledger, so both approve 80
    let first = pipeline.analyze_race(&race(), &field()).await;
    let second = pipeline.analyze_race(&race(), &field()).await;
    assert_eq!(first.decision.as_ref().unwrap().stake_amount, Decimal::from(80));
    assert!(second.decision.as_ref().unwrap().approved);

    assert!(pipeline.place_bet(&first).await.unwrap().is_some());
    // 80 open + 80 would breach the 100 daily stop-loss
    assert!(pipeline.place_bet(&second).await.unwrap().is_none());

    let state = pipeline.ledger().snapshot().await;
    assert_eq!(state.pending_exposure, Decimal::from(80));
}

#[tokio::test]
async fn test_swapped_params_apply_to_next_run() {
    let pipeline = pipeline(ScriptedModel::replying(GOLDEN_EAGLE_JSON));
    pipeline
        .swap_params(RiskParameters {
            confidence_threshold: Decimal::from(90),
            ..RiskParameters::default()
        })
        .await;

    let output = pipeline.analyze_race(&race(), &field()).await;

    assert_eq!(
        output.decision.unwrap().rejection_reason,
        Some(RejectionReason::LowConfidence)
    );
    assert_eq!(pipeline.params().await.confidence_threshold, Decimal::from(90));
}

#[tokio::test]
async fn test_race_without_runners_skips_model_and_decision() {
    let pipeline = pipeline(ScriptedModel::replying(GOLDEN_EAGLE_JSON));

    let output = pipeline.analyze_race(&race(), &[]).await;

    assert_eq!(pipeline.model().calls(), 0);
    assert!(output.decision.is_none());
    assert!(output.ticket.is_none());
    assert_eq!(output.analysis.stake_recommendation, Decimal::ZERO);
}

#[tokio::test]
async fn test_runners_from_other_races_stay_out_of_the_prompt() {
    let pipeline = pipeline(ScriptedModel::replying(GOLDEN_EAGLE_JSON));
    let mut card = field();
    card.push(HorseFacts {
        race_id: RACE_ID + 1,
        ..horse(9, "Stray Visitor", Some(Decimal::from(8)))
    });

    let output = pipeline.analyze_race(&race(), &card).await;

    let prompts = pipeline.model().prompts.lock().unwrap();
    assert!(!prompts[0].contains("Stray Visitor"));
    assert!(prompts[0].contains("Golden Eagle"));
    assert!(output.decision.unwrap().approved);
}

#[tokio::test]
async fn test_card_of_only_foreign_runners_skips_model() {
    let pipeline = pipeline(ScriptedModel::replying(GOLDEN_EAGLE_JSON));
    let card: Vec<HorseFacts> = field()
        .into_iter()
        .map(|h| HorseFacts {
            race_id: RACE_ID + 1,
            ..h
        })
        .collect();

    let output = pipeline.analyze_race(&race(), &card).await;

    assert_eq!(pipeline.model().calls(), 0);
    assert!(output.decision.is_none());
}
