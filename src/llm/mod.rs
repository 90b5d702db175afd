pub mod client;
pub mod prompt;

pub use client::AnthropicClient;
pub use prompt::format_race_prompt;

use async_trait::async_trait;

use crate::errors::ModelError;

/// External prediction model: formatted race facts in, free text out.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn call_model(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Stand-in when no model is configured. Every call fails, so every run
/// takes the fallback path and nothing is staked.
#[derive(Debug, Clone, Default)]
pub struct DisabledModel;

#[async_trait]
impl ModelCaller for DisabledModel {
    async fn call_model(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::Disabled)
    }
}

#[async_trait]
impl<T: ModelCaller + ?Sized> ModelCaller for std::sync::Arc<T> {
    async fn call_model(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).call_model(prompt).await
    }
}
