use rust_decimal::Decimal;
use std::env;
use std::time::Duration;

use crate::execution::RiskParameters;
use crate::models::BetType;

const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Prediction model. Without a key every run takes the fallback path.
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub model_name: String,
    pub model_max_tokens: u32,
    pub model_timeout_secs: u64,

    // Bankroll seed and account caps
    pub bankroll: Decimal,
    pub bankroll_daily_limit: Decimal,
    pub bankroll_weekly_limit: Decimal,

    // Risk parameters
    pub confidence_threshold: Decimal,
    pub max_stake_percentage: Decimal,
    pub correlation_threshold: Decimal,
    pub stop_loss_daily: Decimal,
    pub stop_loss_weekly: Decimal,
    pub max_drawdown_pct: Decimal,

    // Runtime
    pub default_bet_type: BetType,
    pub auto_commit: bool,
    pub race_snapshot_path: Option<String>,
    pub log_format: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let decimal = |key: &str, default: Decimal| -> anyhow::Result<Decimal> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("{key} must be a decimal number: {e}")),
                None => Ok(default),
            }
        };

        let stop_loss_daily = decimal("STOP_LOSS_DAILY", Decimal::from(100))?;
        let stop_loss_weekly = decimal("STOP_LOSS_WEEKLY", Decimal::from(300))?;

        let default_bet_type = match lookup("DEFAULT_BET_TYPE") {
            Some(raw) => BetType::from_api_str(&raw)
                .ok_or_else(|| anyhow::anyhow!("DEFAULT_BET_TYPE must be WIN, PLACE or EACH_WAY"))?,
            None => BetType::Win,
        };

        Ok(Self {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()),
            anthropic_base_url: lookup("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_URL.into()),
            model_name: lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.into()),
            model_max_tokens: lookup("MODEL_MAX_TOKENS")
                .unwrap_or_else(|| "1000".into())
                .parse()?,
            model_timeout_secs: lookup("MODEL_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".into())
                .parse()?,

            bankroll: decimal("BANKROLL", Decimal::from(1_000))?,
            // Account caps default to the policy stop-losses
            bankroll_daily_limit: decimal("BANKROLL_DAILY_LIMIT", stop_loss_daily)?,
            bankroll_weekly_limit: decimal("BANKROLL_WEEKLY_LIMIT", stop_loss_weekly)?,

            confidence_threshold: decimal("CONFIDENCE_THRESHOLD", Decimal::from(70))?,
            max_stake_percentage: decimal("MAX_STAKE_PERCENTAGE", Decimal::new(5, 2))?,
            correlation_threshold: decimal("CORRELATION_THRESHOLD", Decimal::new(7, 1))?,
            stop_loss_daily,
            stop_loss_weekly,
            max_drawdown_pct: decimal("MAX_DRAWDOWN_PCT", Decimal::new(25, 2))?,

            default_bet_type,
            auto_commit: lookup("AUTO_COMMIT")
                .unwrap_or_else(|| "false".into())
                .parse()
                .unwrap_or(false),
            race_snapshot_path: lookup("RACE_SNAPSHOT_PATH"),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "text".into()),
        })
    }

    /// Returns true if the prediction model can be called.
    pub fn has_model_auth(&self) -> bool {
        self.anthropic_api_key.is_some()
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn risk_parameters(&self) -> RiskParameters {
        RiskParameters {
            confidence_threshold: self.confidence_threshold,
            max_stake_percentage: self.max_stake_percentage,
            correlation_threshold: self.correlation_threshold,
            stop_loss_daily: self.stop_loss_daily,
            stop_loss_weekly: self.stop_loss_weekly,
            max_drawdown_pct: self.max_drawdown_pct,
        }
    }
}
