use std::sync::Arc;

use tokio::sync::broadcast;

use racebot::config::AppConfig;
use racebot::execution::{BankrollLedger, LedgerEvent};
use racebot::ingestion::{AnalysisPipeline, PipelineConfig};
use racebot::llm::{AnthropicClient, DisabledModel, ModelCaller};
use racebot::metrics::init_metrics;
use racebot::models::RaceSnapshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log_format);
    let metrics_handle = init_metrics()?;

    // --- Bankroll ledger with event log ---
    let (event_tx, mut event_rx) = broadcast::channel::<LedgerEvent>(256);
    let ledger = BankrollLedger::new(
        config.bankroll,
        config.bankroll_daily_limit,
        config.bankroll_weekly_limit,
    )
    .with_events(event_tx);

    tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(LedgerEvent::BetCommitted(bet)) => {
                    tracing::info!(bet_id = %bet.id, race_id = bet.race_id, stake = %bet.stake, "Bet committed");
                }
                Ok(LedgerEvent::BetSettled { bet, bankroll }) => {
                    tracing::info!(
                        bet_id = %bet.id,
                        status = %bet.status,
                        bankroll = %bankroll.current_amount,
                        "Bet settled"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Ledger event log lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // --- Prediction model ---
    let model: Arc<dyn ModelCaller> = match AnthropicClient::from_config(&config) {
        Some(client) => {
            tracing::info!(model = %client.model(), "Prediction model configured");
            Arc::new(client)
        }
        None => {
            tracing::warn!("No ANTHROPIC_API_KEY, every race will take the fallback path");
            Arc::new(DisabledModel)
        }
    };

    let pipeline = AnalysisPipeline::new(
        model,
        ledger,
        config.risk_parameters(),
        PipelineConfig {
            model_timeout: config.model_timeout(),
            bet_type: config.default_bet_type,
        },
    );

    // --- One race from the snapshot file ---
    let Some(path) = config.race_snapshot_path.as_deref() else {
        tracing::warn!("RACE_SNAPSHOT_PATH is not set, nothing to analyse");
        return Ok(());
    };

    let raw = tokio::fs::read_to_string(path).await?;
    let snapshot: RaceSnapshot = serde_json::from_str(&raw)?;
    tracing::info!(
        race_id = snapshot.race.id,
        track = %snapshot.race.track,
        runners = snapshot.horses.len(),
        "Analysing race"
    );

    let output = pipeline.analyze_race(&snapshot.race, &snapshot.horses).await;
    let record = serde_json::to_string(&output.analysis)?;
    tracing::info!(race_id = snapshot.race.id, analysis = %record, "Race analysed");

    if config.auto_commit {
        match pipeline.place_bet(&output).await {
            Ok(Some(bet)) => {
                let record = serde_json::to_string(&bet)?;
                tracing::info!(bet = %record, "Bet placed");
            }
            Ok(None) => tracing::info!(race_id = snapshot.race.id, "No bet placed"),
            Err(e) => tracing::error!(error = %e, race_id = snapshot.race.id, "Commit failed"),
        }
    }

    let bankroll = pipeline.ledger().snapshot().await;
    tracing::info!(
        current = %bankroll.current_amount,
        pending = %bankroll.pending_exposure,
        daily_loss = %bankroll.daily_loss_to_date,
        "Bankroll"
    );
    tracing::debug!(metrics = %metrics_handle.render(), "Metrics");

    Ok(())
}

fn init_tracing(log_format: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
