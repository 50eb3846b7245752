use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::models::SlotCatalog;
use crate::services::ai::provider_from_config;
use crate::services::assistant::{Interpreter, LlmInterpreter};
use crate::services::backend::{BookingBackend, HttpBackend};
use crate::services::clock::{Clock, SystemClock};
use crate::services::notify::{Notifier, TracingNotifier};
use crate::services::views::StaleViews;
use crate::session::{Credential, Session};

pub struct AppState {
    pub config: AppConfig,
    pub backend: Arc<dyn BookingBackend>,
    pub interpreter: Arc<dyn Interpreter>,
    pub session: Session,
    pub notifier: Box<dyn Notifier>,
    pub views: StaleViews,
    pub catalog: SlotCatalog,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wires the HTTP backend and the configured assistant. The session starts signed in
    /// when `AUTH_TOKEN` is set.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let http = Arc::new(
            HttpBackend::from_config(&config).context("failed to build the HTTP client")?,
        );
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let interpreter: Arc<dyn Interpreter> = match provider_from_config(&config)? {
            Some(llm) => Arc::new(LlmInterpreter::new(llm, Arc::clone(&clock))),
            None => {
                tracing::info!(url = %config.ai_base_url, "using backend assistant");
                http.clone()
            }
        };

        let session = match &config.auth_token {
            Some(token) => Session::signed_in(Credential::bearer(token.clone())),
            None => Session::new(),
        };

        Ok(Self {
            backend: http,
            interpreter,
            session,
            notifier: Box::new(TracingNotifier),
            views: StaleViews::new(),
            catalog: SlotCatalog::standard(),
            clock,
            config,
        })
    }
}
