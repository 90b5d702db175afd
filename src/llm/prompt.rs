use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

use crate::models::{HorseFacts, RaceFacts};

const ANALYST_INSTRUCTION: &str = "You are a professional horse racing analyst. \
Please analyze the following race and provide a detailed prediction.";

/// Answer shape the parser reads. Stake is a fraction of bankroll, not currency.
pub const ANSWER_FORMAT: &str = r#"{
    "winner": "HorseName",
    "confidence": 85.0,
    "reasoning": "Detailed reasoning for your prediction",
    "risk": "LOW",
    "stake": 0.05,
    "profit": 3.5,
    "odds": 3.5
}"#;

/// Render race facts and runners into the prompt handed to the model.
pub fn format_race_prompt(race: &RaceFacts, horses: &[HorseFacts]) -> String {
    let race_json = json!({
        "date": race.race_date.to_rfc3339(),
        "track": race.track,
        "distance": race.distance,
        "race_type": race.race_type,
        "class_rating": race.class_rating,
        "total_runners": race.total_runners.unwrap_or(horses.len() as i32),
    });

    let horses_json: Vec<Value> = horses
        .iter()
        .map(|h| {
            json!({
                "name": h.name,
                "jockey": h.jockey,
                "trainer": h.trainer,
                "odds": h.odds.and_then(|d| d.to_f64()),
                "starting_position": h.starting_position,
                "weight": h.weight.and_then(|d| d.to_f64()),
                "last_race_days": h.last_race_days,
                "wins": h.wins,
                "places": h.places,
                "starts": h.starts,
                "avg_position": h.avg_position.and_then(|d| d.to_f64()),
            })
        })
        .collect();

    let mut prompt = String::from(ANALYST_INSTRUCTION);
    prompt.push_str("\n\nRace Details:\n");
    prompt.push_str(&serde_json::to_string_pretty(&race_json).unwrap_or_default());
    prompt.push_str("\n\nHorses:\n");
    prompt.push_str(&serde_json::to_string_pretty(&horses_json).unwrap_or_default());
    prompt.push_str("\n\nPlease provide your analysis in the following JSON format:\n");
    prompt.push_str(ANSWER_FORMAT);
    prompt.push_str(
        "\n\n\"stake\" is the fraction of bankroll to risk (0.05 = 5%). \
         \"risk\" is one of LOW, MEDIUM, HIGH.\
         \nMake sure to return ONLY the JSON object. Do not include any additional text.",
    );
    prompt
}
