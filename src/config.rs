use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub ai_base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub assistant_provider: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub openrouter_url: String,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            ai_base_url: env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/ai".to_string()),
            auth_token: env::var("AUTH_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            assistant_provider: env::var("ASSISTANT_PROVIDER")
                .unwrap_or_else(|_| "backend".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            openrouter_url: env::var("OPENROUTER_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            openrouter_api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            openrouter_model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "mistralai/mistral-7b-instruct:free".to_string()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
