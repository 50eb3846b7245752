pub mod ollama;
pub mod openrouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;
}

/// Picks the provider named by `ASSISTANT_PROVIDER`; `None` means use the backend assistant.
pub fn provider_from_config(config: &AppConfig) -> anyhow::Result<Option<Box<dyn LlmProvider>>> {
    match config.assistant_provider.as_str() {
        "ollama" => {
            tracing::info!(url = %config.ollama_url, model = %config.ollama_model, "using Ollama assistant");
            Ok(Some(Box::new(ollama::OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
            ))))
        }
        "openrouter" => {
            anyhow::ensure!(
                !config.openrouter_api_key.is_empty(),
                "OPENROUTER_API_KEY must be set when ASSISTANT_PROVIDER=openrouter"
            );
            tracing::info!(model = %config.openrouter_model, "using OpenRouter assistant");
            Ok(Some(Box::new(openrouter::OpenRouterProvider::new(
                config.openrouter_url.clone(),
                config.openrouter_api_key.clone(),
                config.openrouter_model.clone(),
            ))))
        }
        "backend" | "" => Ok(None),
        other => anyhow::bail!("unknown ASSISTANT_PROVIDER: {other}"),
    }
}
