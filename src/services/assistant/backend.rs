use async_trait::async_trait;
use serde_json::json;

use super::Interpreter;
use crate::errors::{BookingError, Result};
use crate::models::{AssistantState, AssistantTurn};
use crate::services::backend::HttpBackend;
use crate::session::Credential;

/// The backend-hosted assistant at `POST {ai}/chat/`.
#[async_trait]
impl Interpreter for HttpBackend {
    async fn interpret(
        &self,
        cred: &Credential,
        utterance: &str,
        state: &AssistantState,
    ) -> Result<AssistantTurn> {
        let body = json!({
            "user_message": utterance,
            "previous_state": state,
        });

        let request = self.client().post(self.ai_url("/chat/")).json(&body);
        match self.send::<AssistantTurn>(request, cred).await {
            Ok(turn) => Ok(turn),
            Err(e @ BookingError::Unauthorized) => Err(e),
            Err(BookingError::Api { status, message }) => Err(BookingError::Assistant(format!(
                "chat endpoint returned {status}: {message}"
            ))),
            Err(e) => Err(e),
        }
    }
}
