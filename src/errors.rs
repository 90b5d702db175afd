use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::BetStatus;

/// Ledger misuse. Fatal to the request, never to the process.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("bet not found: {0}")]
    NotFound(Uuid),

    #[error("bet {id} already settled as {status}")]
    AlreadySettled { id: Uuid, status: BetStatus },

    #[error("{window} exposure {exposure} would exceed account limit {limit}")]
    ExposureLimit {
        window: &'static str,
        exposure: Decimal,
        limit: Decimal,
    },
}

/// Failure of the external prediction model. Always recovered by the
/// pipeline through the fallback path.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no text content")]
    EmptyResponse,

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model caller disabled (no API key configured)")]
    Disabled,
}
