use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use racebot::errors::ModelError;
use racebot::execution::{BankrollLedger, RiskParameters};
use racebot::ingestion::{AnalysisPipeline, PipelineConfig};
use racebot::llm::ModelCaller;
use racebot::models::{BetType, HorseFacts, RaceFacts};

pub const RACE_ID: i64 = 42;

/// What a scripted model does on every call.
#[allow(dead_code)]
pub enum Script {
    Reply(String),
    Fail,
    Hang(Duration),
}

/// Model double that follows a script and records the prompts it was given.
pub struct ScriptedModel {
    script: Script,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn replying(text: &str) -> Self {
        Self::new(Script::Reply(text.to_string()))
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelCaller for ScriptedModel {
    async fn call_model(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail => Err(ModelError::Status {
                status: 529,
                body: "overloaded".into(),
            }),
            Script::Hang(d) => {
                tokio::time::sleep(*d).await;
                Ok(String::new())
            }
        }
    }
}

#[allow(dead_code)]
pub fn race() -> RaceFacts {
    RaceFacts {
        id: RACE_ID,
        race_date: Utc.with_ymd_and_hms(2026, 10, 18, 14, 30, 0).unwrap(),
        track: "Newmarket".into(),
        distance: 1400,
        race_type: "Flat".into(),
        class_rating: Some(4),
        total_runners: Some(3),
    }
}

#[allow(dead_code)]
pub fn horse(id: i64, name: &str, odds: Option<Decimal>) -> HorseFacts {
    HorseFacts {
        id,
        race_id: RACE_ID,
        name: name.into(),
        jockey: Some("A. Rider".into()),
        trainer: Some("B. Trainer".into()),
        odds,
        starting_position: Some(id as i32),
        weight: Some(Decimal::new(575, 1)),
        last_race_days: Some(14),
        wins: Some(3),
        places: Some(5),
        starts: Some(12),
        avg_position: Some(Decimal::new(32, 1)),
    }
}

#[allow(dead_code)]
pub fn field() -> Vec<HorseFacts> {
    vec![
        horse(1, "Golden Eagle", Some(Decimal::new(35, 1))),
        horse(2, "Silver Streak", Some(Decimal::new(50, 1))),
        horse(3, "Night Owl", None),
    ]
}

/// 1000 bankroll, 100 daily and 300 weekly caps.
#[allow(dead_code)]
pub fn ledger() -> BankrollLedger {
    BankrollLedger::new(Decimal::from(1_000), Decimal::from(100), Decimal::from(300))
}

#[allow(dead_code)]
pub fn pipeline(model: ScriptedModel) -> AnalysisPipeline<ScriptedModel> {
    AnalysisPipeline::new(
        model,
        ledger(),
        RiskParameters::default(),
        PipelineConfig {
            model_timeout: Duration::from_millis(200),
            bet_type: BetType::Win,
        },
    )
}

/// Wednesday of the ISO week starting Monday 2026-10-12.
#[allow(dead_code)]
pub fn wednesday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
}
