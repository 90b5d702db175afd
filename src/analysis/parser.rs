use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::models::{ParseConfidence, ParsedPrediction, RiskLabel};

const WINNER_KEYS: &[&str] = &["winner", "winner_prediction", "winner_name"];
const CONFIDENCE_KEYS: &[&str] = &["confidence", "confidence_score"];
const REASONING_KEYS: &[&str] = &["reasoning", "analysis_reasoning"];
const RISK_KEYS: &[&str] = &["risk", "risk_assessment", "risk_label"];
const STAKE_KEYS: &[&str] = &["stake", "suggested_stake", "stake_fraction"];
const PROFIT_KEYS: &[&str] = &["profit", "expected_profit"];
const ODDS_KEYS: &[&str] = &["odds", "implied_odds"];

/// Names a model uses when it declines to pick.
const PLACEHOLDER_NAMES: &[&str] = &["unknown", "none", "n/a", "na", "null", "tbd"];

/// Lowercase words that end (or rule out) a lexically matched name.
const FILLER_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "be", "because", "but", "by", "for", "has", "in", "is", "it",
    "of", "on", "or", "should", "that", "the", "this", "to", "was", "which", "who", "will", "with",
];

lazy_static! {
    // "winner" then up to a few separators, an optional "is"/"will be"/"should be",
    // then a run of at most four words, trimmed to the name by `candidate_name`.
    static ref WINNER_RE: Regex = Regex::new(
        r#"(?i)\bwinner\b[\s"':=\-]{0,6}(?:(?:is|will\s+be|should\s+be)\s+)?["']?([a-z0-9][a-z0-9'\-]*(?:[ \t]+[a-z0-9][a-z0-9'\-]*){0,3})"#
    )
    .unwrap();
}

fn default_confidence() -> Decimal {
    Decimal::from(75)
}

fn default_stake_fraction() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

/// Turn raw model output into a typed prediction.
///
/// Never fails. Tries, in order:
/// 1. the first well-formed JSON object anywhere in the text (FULL, or PARTIAL
///    when a numeric field had to be defaulted),
/// 2. a lexical "winner ... Name" match (PARTIAL),
/// 3. the FALLBACK sentinel, whose `reasoning` says why.
pub fn parse_prediction(raw_text: &str) -> ParsedPrediction {
    if raw_text.trim().is_empty() {
        return ParsedPrediction::fallback("Could not parse model response: empty response");
    }

    let structured_note = match first_json_object(raw_text) {
        Some(object) => match from_json_object(&object) {
            Some(prediction) => return prediction,
            None => "JSON object has no winner",
        },
        None => "no JSON object found",
    };

    if let Some(winner) = lexical_winner(raw_text) {
        return ParsedPrediction {
            reasoning: format!("Extracted winner prediction from unstructured text: {winner}"),
            winner_name: winner,
            confidence_score: default_confidence(),
            risk_label: RiskLabel::Unknown,
            suggested_stake_fraction: default_stake_fraction(),
            expected_profit: Decimal::ZERO,
            implied_odds: Decimal::ZERO,
            parse_confidence: ParseConfidence::Partial,
        };
    }

    ParsedPrediction::fallback(format!(
        "Could not parse model response: {structured_note} and no winner token in text"
    ))
}

/// First `{` from which a complete JSON object deserializes. Prose before and
/// after the object, and code fences around it, are ignored.
fn first_json_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => Some(map),
            _ => None,
        }
    })
}

fn from_json_object(object: &Map<String, Value>) -> Option<ParsedPrediction> {
    let winner = lookup(object, WINNER_KEYS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|w| !w.is_empty())?
        .to_string();

    let mut defaulted = false;
    let mut numeric = |keys: &[&str], default: Decimal| match lookup(object, keys).and_then(to_decimal) {
        Some(value) => value,
        None => {
            defaulted = true;
            default
        }
    };

    let confidence = numeric(CONFIDENCE_KEYS, default_confidence());
    let stake_fraction = numeric(STAKE_KEYS, default_stake_fraction());
    let profit = numeric(PROFIT_KEYS, Decimal::ZERO);
    let odds = numeric(ODDS_KEYS, Decimal::ZERO);

    let reasoning = lookup(object, REASONING_KEYS)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("No reasoning provided")
        .to_string();

    let risk_label = lookup(object, RISK_KEYS)
        .and_then(Value::as_str)
        .map(RiskLabel::from_model_str)
        .unwrap_or(RiskLabel::Unknown);

    Some(ParsedPrediction {
        winner_name: winner,
        confidence_score: confidence.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
        reasoning,
        risk_label,
        suggested_stake_fraction: stake_fraction.max(Decimal::ZERO),
        expected_profit: profit,
        implied_odds: odds.max(Decimal::ZERO),
        parse_confidence: if defaulted {
            ParseConfidence::Partial
        } else {
            ParseConfidence::Full
        },
    })
}

/// Case-insensitive key lookup over a list of accepted spellings.
fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

/// Accepts JSON numbers and numeric strings ("85", "85%", "3.5").
fn to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| value.as_f64().and_then(Decimal::from_f64))
}

fn lexical_winner(text: &str) -> Option<String> {
    WINNER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| candidate_name(m.as_str()))
        .find(|name| !is_placeholder(name))
}

/// Trim a matched run of words to the name. A capitalised name keeps its
/// capitalised words; a lowercase one stops at the first filler word. A run
/// opening with a filler word ("winner of this race") is not a name.
fn candidate_name(run: &str) -> Option<String> {
    let mut words = run.split_whitespace();
    let first = words.next()?;
    if FILLER_WORDS.contains(&first) {
        return None;
    }

    let capitalised = first
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());

    let mut name = vec![first];
    for word in words {
        let keep = if capitalised {
            word.chars().next().is_some_and(char::is_uppercase)
        } else {
            !FILLER_WORDS.contains(&word)
        };
        if !keep {
            break;
        }
        name.push(word);
    }

    let name = name.join(" ");
    let name = name.trim_end_matches(['\'', '-']);
    (!name.is_empty()).then(|| name.to_string())
}

fn is_placeholder(name: &str) -> bool {
    PLACEHOLDER_NAMES
        .iter()
        .any(|p| name.eq_ignore_ascii_case(p))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
