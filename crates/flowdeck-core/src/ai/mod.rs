pub mod claude;
pub mod ollama;
pub mod openai;
#[cfg(test)]
pub(crate) mod scripted;

pub use claude::ClaudeClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::config::Config;
use crate::provider::Provider;

/// A text completion backend
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Complete a prompt with free text
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Complete a prompt that asks for a JSON object. Backends that can
    /// constrain their output override this.
    async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await
    }

    fn name(&self) -> &str;

    fn model(&self) -> &str;
}

/// Build the configured backend. Keys come from the environment first, then config.
pub fn build_service(
    config: &Config,
    provider: Provider,
    model: Option<&str>,
) -> Result<Arc<dyn LlmService>> {
    let model = model
        .map(str::to_string)
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| provider.default_model().to_string());

    let service: Arc<dyn LlmService> = match provider {
        Provider::Ollama => Arc::new(OllamaClient::new(&config.ollama_url(), &model)),
        Provider::Claude => {
            let key = std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .or_else(|| config.claude_api_key.clone())
                .ok_or_else(|| {
                    anyhow!(
                        "Claude API key not configured. Set ANTHROPIC_API_KEY or add claude_api_key to {}",
                        Config::describe_path()
                    )
                })?;
            Arc::new(ClaudeClient::new(&key, &model))
        }
        Provider::OpenAI => {
            let key = std::env::var("OPENAI_API_KEY")
                .ok()
                .or_else(|| config.openai_api_key.clone())
                .ok_or_else(|| {
                    anyhow!(
                        "OpenAI API key not configured. Set OPENAI_API_KEY or add openai_api_key to {}",
                        Config::describe_path()
                    )
                })?;
            Arc::new(OpenAIClient::new(&key, &model))
        }
    };

    tracing::info!(provider = service.name(), model = service.model(), "AI service ready");
    Ok(service)
}
