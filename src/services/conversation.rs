use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::{BookingError, Result};
use crate::models::{describe_offered, is_offered, AssistantState, ServiceCatalogEntry};
use crate::services::booking_intent::BookingIntent;
use crate::services::clock::parse_user_date;
use crate::services::coordinator::BookingCoordinator;
use crate::services::voice::{Speaker, Transcriber};
use crate::state::AppState;

pub const GREETING: &str = "Hello! I'm your AI booking assistant. How can I help you today?";
const FALLBACK: &str = "Sorry, something went wrong. Please try again.";
const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The assistant call site: free text (or speech) in, replies out. Bookings it makes
/// go through the same coordinator as the form.
pub struct ChatSession {
    coordinator: BookingCoordinator,
    assistant: AssistantState,
    transcript: Vec<ChatMessage>,
    speaker: Option<Arc<dyn Speaker>>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl ChatSession {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            coordinator: BookingCoordinator::new(state),
            assistant: AssistantState::default(),
            transcript: vec![ChatMessage::new(ChatRole::Assistant, GREETING)],
            speaker: None,
            transcriber: None,
        }
    }

    pub fn with_speaker(mut self, speaker: Arc<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn assistant_state(&self) -> &AssistantState {
        &self.assistant
    }

    /// Handles one utterance and returns the replies added to the transcript.
    pub async fn process_message(&mut self, utterance: &str) -> Vec<String> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return vec![];
        }
        self.transcript
            .push(ChatMessage::new(ChatRole::User, utterance));

        let replies = match self.turn(utterance).await {
            Ok(replies) => replies,
            Err(BookingError::Unauthorized) => vec![SESSION_EXPIRED.to_string()],
            Err(e) => {
                tracing::warn!(error = %e, "chat turn failed");
                vec![FALLBACK.to_string()]
            }
        };

        for reply in &replies {
            self.transcript
                .push(ChatMessage::new(ChatRole::Assistant, reply.clone()));
            self.say(reply).await;
        }
        replies
    }

    pub async fn process_audio(&mut self, audio: &[u8]) -> Vec<String> {
        let Some(transcriber) = self.transcriber.clone() else {
            return vec!["Voice input is not available.".to_string()];
        };
        match transcriber.transcribe(audio).await {
            Ok(text) if !text.trim().is_empty() => self.process_message(&text).await,
            Ok(_) => vec!["I didn't catch that. Please try again.".to_string()],
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                vec!["Sorry, I couldn't understand the audio. Please try again.".to_string()]
            }
        }
    }

    async fn say(&self, text: &str) {
        if let Some(speaker) = &self.speaker {
            if let Err(e) = speaker.speak(text).await {
                tracing::warn!(error = %e, "speech output failed");
            }
        }
    }

    async fn turn(&mut self, utterance: &str) -> Result<Vec<String>> {
        let state = self.coordinator.state();
        let cred = state.session.guard(state.session.credential())?;
        let result = state
            .interpreter
            .interpret(&cred, utterance, &self.assistant)
            .await;
        let turn = state.session.guard(result)?;

        tracing::info!(
            intent = ?turn.intent,
            service = ?turn.service_type,
            date = ?turn.date,
            time = ?turn.time,
            "assistant turn"
        );
        self.assistant.merge(&turn);

        let mut replies = vec![];
        if !turn.response.trim().is_empty() {
            replies.push(turn.response.trim().to_string());
        }

        if self.assistant.wants_booking() {
            if let (Some(service), Some(date)) =
                (self.assistant.service_type.clone(), self.assistant.date.clone())
            {
                replies.extend(self.try_book(&service, &date).await?);
            }
        }
        Ok(replies)
    }

    async fn try_book(&mut self, service_name: &str, date_text: &str) -> Result<Vec<String>> {
        let service = match self.coordinator.resolve_service(service_name).await {
            Ok(service) => service,
            Err(BookingError::UnknownService(_)) => {
                tracing::info!(service = service_name, "assistant named an unknown service");
                self.assistant.service_type = None;
                return Ok(vec![format!(
                    "Sorry, I couldn't find a service called \"{service_name}\". Which service would you like?"
                )]);
            }
            Err(e) => return Err(e),
        };

        let Some(date) = parse_user_date(date_text, self.coordinator.today()) else {
            self.assistant.date = None;
            return Ok(vec![format!(
                "Sorry, I couldn't understand the date \"{date_text}\". Please use YYYY-MM-DD."
            )]);
        };

        let mut intent = BookingIntent::new(service.id.clone());
        match self.coordinator.select_date(&mut intent, date) {
            Ok(()) => {}
            Err(BookingError::Validation(msg)) => {
                self.assistant.date = None;
                return Ok(vec![msg]);
            }
            Err(e) => return Err(e),
        }
        match self.coordinator.load_slots(&mut intent).await {
            Ok(()) => {}
            Err(BookingError::Unauthorized) => return Err(BookingError::Unauthorized),
            Err(e) => {
                tracing::warn!(
                    service = %service.name,
                    date = %date,
                    error = %e,
                    "chat could not load availability"
                );
                return Ok(vec![format!(
                    "Sorry, I couldn't load the available slots for {} on {date}. Please try again.",
                    service.name
                )]);
            }
        }

        let slots = intent.slots().unwrap_or(&[]);
        let listing = describe_offered(&service.name, &date, slots);

        let wanted = self
            .assistant
            .time
            .as_deref()
            .and_then(|t| self.coordinator.catalog().match_slot(t))
            .map(str::to_string);
        let Some(slot) = wanted else {
            return Ok(vec![listing]);
        };
        if !is_offered(slots, &slot) {
            self.assistant.time = None;
            return Ok(vec![
                format!("The {slot} slot is not available on {date}."),
                listing,
            ]);
        }

        self.book(&service, date, &slot, intent).await
    }

    async fn book(
        &mut self,
        service: &ServiceCatalogEntry,
        date: NaiveDate,
        slot: &str,
        mut intent: BookingIntent,
    ) -> Result<Vec<String>> {
        self.coordinator.select_slot(&mut intent, slot).await?;
        if let Some(instructions) = &self.assistant.instructions {
            intent.set_instructions(instructions);
        }

        match self.coordinator.submit(&mut intent).await {
            Ok(booking) => {
                self.assistant = AssistantState {
                    booked: true,
                    completed_service: true,
                    ..Default::default()
                };
                Ok(vec![format!(
                    "✅ Booking created for {} on {} at {}.",
                    service.name, booking.date, booking.time_slot
                )])
            }
            Err(BookingError::SlotTaken { .. }) => {
                self.assistant.time = None;
                self.coordinator.recover(&mut intent).await?;
                let slots = intent.slots().unwrap_or(&[]);
                Ok(vec![
                    format!("Sorry, the {slot} slot was just taken."),
                    describe_offered(&service.name, &date, slots),
                ])
            }
            Err(e) => Err(e),
        }
    }
}
