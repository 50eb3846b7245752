pub mod backend;
pub mod llm;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{AssistantState, AssistantTurn};
use crate::session::Credential;

pub use llm::LlmInterpreter;

/// Turns an utterance plus prior conversational state into structured fields.
///
/// Implementations may be nondeterministic and may leave any field empty.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(
        &self,
        cred: &Credential,
        utterance: &str,
        state: &AssistantState,
    ) -> Result<AssistantTurn>;
}
