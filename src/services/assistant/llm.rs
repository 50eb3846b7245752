use std::sync::Arc;

use async_trait::async_trait;

use super::Interpreter;
use crate::errors::{BookingError, Result};
use crate::models::{AssistantState, AssistantTurn};
use crate::services::ai::{LlmProvider, Message};
use crate::services::clock::Clock;
use crate::session::Credential;

const SYSTEM_PROMPT: &str = "You are a helpful assistant to book hostel services.";

const TURN_INSTRUCTIONS: &str = r#"You are an AI booking assistant.

You will get:
- context: previously extracted fields (intent, serviceType, date, time, instructions)
- user_message: new user input

Update the fields based on the user input.

Rules:
- Resolve relative dates ("today", "tomorrow", "next Monday") to an actual date formatted YYYY-MM-DD.
- intent is lowercase, one of: "book", "cancel", "reschedule", "info", "other".
- serviceType is one of: "laundry", "room cleaning", "study space", "room repairs", "tech support".
- time is a slot such as "10:00-12:00" or a start time such as "10:00".
- Leave a field null when the user has not said it.

Return ONLY valid JSON (no markdown, no explanation):
{
  "response": "your short reply to the user",
  "intent": "...",
  "serviceType": "...",
  "date": "...",
  "time": "...",
  "instructions": "..."
}
"#;

pub struct LlmInterpreter {
    llm: Box<dyn LlmProvider>,
    clock: Arc<dyn Clock>,
}

impl LlmInterpreter {
    pub fn new(llm: Box<dyn LlmProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { llm, clock }
    }

    fn build_prompt(&self, utterance: &str, state: &AssistantState) -> String {
        let context = serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string());
        format!(
            "{TURN_INSTRUCTIONS}\nToday is {}.\n\ncontext:\n{context}\n\nuser_message: {:?}",
            self.clock.today().format("%Y-%m-%d (%A)"),
            utterance,
        )
    }
}

#[async_trait]
impl Interpreter for LlmInterpreter {
    async fn interpret(
        &self,
        _cred: &Credential,
        utterance: &str,
        state: &AssistantState,
    ) -> Result<AssistantTurn> {
        let prompt = self.build_prompt(utterance, state);
        let response = self
            .llm
            .chat(SYSTEM_PROMPT, &[Message::user(prompt)])
            .await
            .map_err(|e| BookingError::Assistant(format!("{e:#}")))?;

        Ok(parse_turn_response(&response))
    }
}

pub fn parse_turn_response(response: &str) -> AssistantTurn {
    if let Ok(turn) = serde_json::from_str::<AssistantTurn>(response) {
        return turn;
    }

    // Strip markdown code fences
    let trimmed = response.trim();
    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(turn) = serde_json::from_str::<AssistantTurn>(cleaned) {
        return turn;
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if start < end {
            if let Ok(turn) = serde_json::from_str::<AssistantTurn>(&cleaned[start..=end]) {
                return turn;
            }
        }
    }

    tracing::warn!("assistant reply was not JSON, using it as plain text");
    AssistantTurn {
        response: trimmed.to_string(),
        ..Default::default()
    }
}
