use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChatIntent {
    Book,
    Cancel,
    Reschedule,
    Info,
    Other,
}

impl ChatIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatIntent::Book => "book",
            ChatIntent::Cancel => "cancel",
            ChatIntent::Reschedule => "reschedule",
            ChatIntent::Info => "info",
            ChatIntent::Other => "other",
        }
    }
}

impl From<String> for ChatIntent {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "book" | "booking" => ChatIntent::Book,
            "cancel" => ChatIntent::Cancel,
            "reschedule" => ChatIntent::Reschedule,
            "info" | "general_question" => ChatIntent::Info,
            _ => ChatIntent::Other,
        }
    }
}

impl From<ChatIntent> for String {
    fn from(intent: ChatIntent) -> Self {
        intent.as_str().to_string()
    }
}

/// One reply from the interpreter. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub intent: Option<ChatIntent>,
    #[serde(default, rename = "serviceType")]
    pub service_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// Fields gathered across the conversation, sent back to the interpreter as context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<ChatIntent>,
    #[serde(rename = "serviceType", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub booked: bool,
    #[serde(default)]
    pub completed_service: bool,
}

impl AssistantState {
    /// Fields the interpreter left empty keep their previous value.
    pub fn merge(&mut self, turn: &AssistantTurn) {
        fn fill(slot: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *slot = Some(v.to_string());
            }
        }

        if turn.intent.is_some() {
            self.intent = turn.intent.clone();
        }
        fill(&mut self.service_type, &turn.service_type);
        fill(&mut self.date, &turn.date);
        fill(&mut self.time, &turn.time);
        fill(&mut self.instructions, &turn.instructions);
        self.booked = false;
    }

    pub fn wants_booking(&self) -> bool {
        self.intent == Some(ChatIntent::Book)
    }
}
