#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use hostelflow::config::AppConfig;
use hostelflow::errors::{BookingError, Result};
use hostelflow::models::{
    Ack, AssistantState, AssistantTurn, Booking, BookingStatus, LoginRequest, LoginResponse,
    NewBooking, ProviderStatus, RatingRequest, RescheduleRequest, ResidentNotification,
    ServiceCatalogEntry, SlotCatalog, SlotQuery, StatusUpdate, UnavailabilitySet, UserProfile,
};
use hostelflow::services::assistant::Interpreter;
use hostelflow::services::backend::BookingBackend;
use hostelflow::services::clock::FixedClock;
use hostelflow::services::notify::{Notice, Notifier};
use hostelflow::services::views::StaleViews;
use hostelflow::services::voice::{Speaker, Transcriber};
use hostelflow::session::{Credential, Session};
use hostelflow::state::AppState;

pub const TOKEN: &str = "resident-token";
pub const EXPIRED_TOKEN: &str = "expired-token";
pub const OTHER_RESIDENT: &str = "someone-else";
/// Runs the Laundry service.
pub const PROVIDER_TOKEN: &str = "provider-token";
pub const RESIDENT_EMAIL: &str = "resident@example.com";
pub const PROVIDER_EMAIL: &str = "laundry@example.com";
pub const PASSWORD: &str = "correct horse";

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn today() -> NaiveDate {
    date("2025-03-09")
}

pub fn service(id: &str, name: &str) -> ServiceCatalogEntry {
    ServiceCatalogEntry {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} service"),
        price: 5.0,
        duration: "2 hours".to_string(),
        rating: 4.5,
        availability: true,
        provider_name: None,
    }
}

pub fn laundry() -> ServiceCatalogEntry {
    service("7", "Laundry")
}

pub fn booking(
    id: &str,
    service: ServiceCatalogEntry,
    on: &str,
    slot: &str,
    status: BookingStatus,
) -> Booking {
    Booking {
        id: id.to_string(),
        user: Some(TOKEN.to_string()),
        service,
        date: date(on),
        time_slot: slot.to_string(),
        special_instructions: None,
        status,
        rating: None,
        comment: None,
        provider_name: None,
        room_number: Some("B-204".to_string()),
    }
}

pub fn profile(email: &str, provider: bool) -> UserProfile {
    UserProfile {
        id: if provider { "2" } else { "1" }.to_string(),
        email: email.to_string(),
        username: Some(if provider { "campus-laundry" } else { "resident" }.to_string()),
        room_number: (!provider).then(|| "B-204".to_string()),
        is_superuser: false,
        is_serviceprovider: provider,
    }
}

// ── Mock Backend ──

/// In-memory backend enforcing the unique (service, date, slot) rule over
/// non-cancelled bookings.
pub struct MockBackend {
    services: Vec<ServiceCatalogEntry>,
    bookings: Mutex<Vec<Booking>>,
    next_id: AtomicU64,
    delays: Mutex<HashMap<NaiveDate, Duration>>,
    pub fail_availability: AtomicBool,
    pub availability_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub rate_calls: AtomicUsize,
    pub created: Mutex<Vec<NewBooking>>,
    race: Mutex<Option<(String, String, String)>>,
    notifications: Mutex<Vec<ResidentNotification>>,
    pub status_updates: Mutex<Vec<(String, ProviderStatus)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            services: vec![
                laundry(),
                service("3", "Room Cleaning"),
                service("9", "Tech Support"),
            ],
            bookings: Mutex::new(vec![]),
            next_id: AtomicU64::new(100),
            delays: Mutex::new(HashMap::new()),
            fail_availability: AtomicBool::new(false),
            availability_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            rate_calls: AtomicUsize::new(0),
            created: Mutex::new(vec![]),
            race: Mutex::new(None),
            notifications: Mutex::new(vec![]),
            status_updates: Mutex::new(vec![]),
        }
    }

    /// Another resident grabs the slot while our next create or reschedule is in flight.
    pub fn take_during_submit(&self, service_id: &str, on: &str, slot: &str) {
        *self.race.lock().unwrap() =
            Some((service_id.to_string(), on.to_string(), slot.to_string()));
    }

    fn run_race(&self) {
        let armed = self.race.lock().unwrap().take();
        if let Some((service_id, on, slot)) = armed {
            self.take_slot(&service_id, &on, &slot);
        }
    }

    pub fn notify(&self, id: &str, message: &str, read: bool) {
        self.notifications.lock().unwrap().push(ResidentNotification {
            id: id.to_string(),
            message: message.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 9, 8, 0, 0).unwrap(),
            read,
        });
    }

    pub fn notification(&self, id: &str) -> Option<ResidentNotification> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// Another resident books the slot behind our back.
    pub fn take_slot(&self, service_id: &str, on: &str, slot: &str) {
        let service = self.service(service_id).unwrap();
        let mut taken = booking(
            &self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            service,
            on,
            slot,
            BookingStatus::Booked,
        );
        taken.user = Some(OTHER_RESIDENT.to_string());
        self.bookings.lock().unwrap().push(taken);
    }

    pub fn seed(&self, booking: Booking) {
        self.bookings.lock().unwrap().push(booking);
    }

    pub fn delay(&self, on: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(date(on), delay);
    }

    pub fn find(&self, id: &str) -> Option<Booking> {
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub fn availability_calls(&self) -> usize {
        self.availability_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn service(&self, id: &str) -> Result<ServiceCatalogEntry> {
        self.services
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("service {id}")))
    }

    fn authorize(&self, cred: &Credential) -> Result<()> {
        if cred.token() == EXPIRED_TOKEN {
            return Err(BookingError::Unauthorized);
        }
        Ok(())
    }

    fn authorize_provider(&self, cred: &Credential) -> Result<()> {
        self.authorize(cred)?;
        if cred.token() != PROVIDER_TOKEN {
            return Err(BookingError::Forbidden("Not a service provider".to_string()));
        }
        Ok(())
    }

    fn is_taken(&self, service_id: &str, on: NaiveDate, slot: &str, except: Option<&str>) -> bool {
        self.bookings.lock().unwrap().iter().any(|b| {
            b.service.id == service_id
                && b.date == on
                && b.time_slot == slot
                && b.status != BookingStatus::Cancelled
                && Some(b.id.as_str()) != except
        })
    }
}

#[async_trait]
impl BookingBackend for MockBackend {
    async fn list_services(&self, cred: &Credential) -> Result<Vec<ServiceCatalogEntry>> {
        self.authorize(cred)?;
        Ok(self.services.clone())
    }

    async fn find_service_by_name(
        &self,
        cred: &Credential,
        name: &str,
    ) -> Result<Option<ServiceCatalogEntry>> {
        self.authorize(cred)?;
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .services
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn unavailable_slots(
        &self,
        cred: &Credential,
        query: &SlotQuery,
    ) -> Result<UnavailabilitySet> {
        self.availability_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(cred)?;

        let delay = self.delays.lock().unwrap().get(&query.date).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_availability.load(Ordering::SeqCst) {
            return Err(BookingError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        let bookings = self.bookings.lock().unwrap();
        Ok(bookings
            .iter()
            .filter(|b| {
                b.service.id == query.service_id
                    && b.date == query.date
                    && b.status != BookingStatus::Cancelled
            })
            .map(|b| b.time_slot.clone())
            .collect())
    }

    async fn create_booking(&self, cred: &Credential, new: &NewBooking) -> Result<Booking> {
        self.authorize(cred)?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(new.clone());
        self.run_race();

        if self.is_taken(&new.service_id, new.date, &new.time_slot, None) {
            return Err(BookingError::SlotTaken {
                date: new.date.to_string(),
                time_slot: new.time_slot.clone(),
            });
        }

        let mut created = booking(
            &self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            self.service(&new.service_id)?,
            &new.date.to_string(),
            &new.time_slot,
            BookingStatus::Booked,
        );
        created.user = Some(cred.token().to_string());
        created.special_instructions =
            Some(new.special_instructions.clone()).filter(|s| !s.is_empty());
        self.bookings.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn reschedule_booking(
        &self,
        cred: &Credential,
        booking: &Booking,
        request: &RescheduleRequest,
    ) -> Result<Booking> {
        self.authorize(cred)?;
        self.run_race();
        if self.is_taken(
            &booking.service.id,
            request.date,
            &request.time_slot,
            Some(&booking.id),
        ) {
            return Err(BookingError::SlotTaken {
                date: request.date.to_string(),
                time_slot: request.time_slot.clone(),
            });
        }

        let mut bookings = self.bookings.lock().unwrap();
        let stored = bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
        stored.date = request.date;
        stored.time_slot = request.time_slot.clone();
        Ok(stored.clone())
    }

    async fn cancel_booking(&self, cred: &Credential, booking_id: &str) -> Result<Ack> {
        self.authorize(cred)?;
        let mut bookings = self.bookings.lock().unwrap();
        let stored = bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
        stored.status = BookingStatus::Cancelled;
        Ok(Ack {
            message: Some("Booking cancelled successfully".to_string()),
        })
    }

    async fn my_bookings(&self, cred: &Credential) -> Result<Vec<Booking>> {
        self.authorize(cred)?;
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user.as_deref() == Some(cred.token()))
            .cloned()
            .collect())
    }

    async fn rate_booking(
        &self,
        cred: &Credential,
        booking_id: &str,
        rating: &RatingRequest,
    ) -> Result<Ack> {
        self.authorize(cred)?;
        self.rate_calls.fetch_add(1, Ordering::SeqCst);
        let mut bookings = self.bookings.lock().unwrap();
        let stored = bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
        stored.rating = Some(rating.rating);
        stored.comment = rating.comment.clone();
        Ok(Ack {
            message: Some("Rating submitted successfully".to_string()),
        })
    }

    async fn profile(&self, cred: &Credential) -> Result<UserProfile> {
        self.authorize(cred)?;
        if cred.token() == PROVIDER_TOKEN {
            Ok(profile(PROVIDER_EMAIL, true))
        } else {
            Ok(profile(RESIDENT_EMAIL, false))
        }
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let token = match (request.email.as_str(), request.password.as_str()) {
            (RESIDENT_EMAIL, PASSWORD) => TOKEN,
            (PROVIDER_EMAIL, PASSWORD) => PROVIDER_TOKEN,
            _ => return Err(BookingError::validation("Invalid email or password.")),
        };
        Ok(LoginResponse {
            user: profile(&request.email, token == PROVIDER_TOKEN),
            access_token: token.to_string(),
        })
    }

    async fn assigned_bookings(&self, cred: &Credential) -> Result<Vec<Booking>> {
        self.authorize_provider(cred)?;
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.service.id == "7")
            .cloned()
            .collect())
    }

    async fn update_booking_status(
        &self,
        cred: &Credential,
        booking_id: &str,
        update: &StatusUpdate,
    ) -> Result<Ack> {
        self.authorize_provider(cred)?;
        let mut bookings = self.bookings.lock().unwrap();
        let stored = bookings
            .iter_mut()
            .find(|b| b.id == booking_id)
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;
        stored.status = update.status.into();
        self.status_updates
            .lock()
            .unwrap()
            .push((booking_id.to_string(), update.status));
        Ok(Ack {
            message: Some("Status updated".to_string()),
        })
    }

    async fn notifications(&self, cred: &Credential) -> Result<Vec<ResidentNotification>> {
        self.authorize(cred)?;
        Ok(self.notifications.lock().unwrap().clone())
    }

    async fn mark_notification_read(
        &self,
        cred: &Credential,
        notification_id: &str,
    ) -> Result<Ack> {
        self.authorize(cred)?;
        let mut notifications = self.notifications.lock().unwrap();
        let stored = notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| BookingError::NotFound("Notification not found".to_string()))?;
        stored.read = true;
        Ok(Ack { message: None })
    }
}

// ── Mock Interpreter ──

/// Plays back scripted turns and records what it was asked.
pub struct MockInterpreter {
    script: Mutex<VecDeque<AssistantTurn>>,
    pub seen: Mutex<Vec<(String, AssistantState)>>,
}

impl MockInterpreter {
    pub fn new(turns: Vec<AssistantTurn>) -> Self {
        Self {
            script: Mutex::new(turns.into()),
            seen: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl Interpreter for MockInterpreter {
    async fn interpret(
        &self,
        _cred: &Credential,
        utterance: &str,
        state: &AssistantState,
    ) -> Result<AssistantTurn> {
        self.seen
            .lock()
            .unwrap()
            .push((utterance.to_string(), state.clone()));
        Ok(self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| AssistantTurn {
                response: "How else can I help?".to_string(),
                ..Default::default()
            }))
    }
}

pub fn book_turn(service: &str, on: &str, time: Option<&str>) -> AssistantTurn {
    AssistantTurn {
        response: format!("Let me check {service} for you."),
        intent: Some(hostelflow::models::ChatIntent::Book),
        service_type: Some(service.to_string()),
        date: Some(on.to_string()),
        time: time.map(str::to_string),
        instructions: None,
    }
}

// ── Recording capabilities ──

pub struct RecordingNotifier {
    pub notices: Arc<Mutex<Vec<Notice>>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub struct RecordingSpeaker {
    pub spoken: Mutex<Vec<String>>,
    pub broken: bool,
}

impl RecordingSpeaker {
    pub fn new(broken: bool) -> Self {
        Self {
            spoken: Mutex::new(vec![]),
            broken,
        }
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> anyhow::Result<()> {
        if self.broken {
            anyhow::bail!("audio device unavailable");
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub struct FixedTranscriber(pub String);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8]) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

// ── Helpers ──

pub fn test_config() -> AppConfig {
    AppConfig {
        api_base_url: "http://localhost:8000/api".to_string(),
        ai_base_url: "http://localhost:8000/ai".to_string(),
        auth_token: Some(TOKEN.to_string()),
        request_timeout_secs: 5,
        assistant_provider: "backend".to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3.2".to_string(),
        openrouter_url: "https://openrouter.ai/api/v1".to_string(),
        openrouter_api_key: String::new(),
        openrouter_model: "test".to_string(),
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub backend: Arc<MockBackend>,
    pub interpreter: Arc<MockInterpreter>,
    pub notices: Arc<Mutex<Vec<Notice>>>,
}

impl Harness {
    pub fn notice_titles(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

pub fn harness_with(token: &str, turns: Vec<AssistantTurn>) -> Harness {
    let backend = Arc::new(MockBackend::new());
    let interpreter = Arc::new(MockInterpreter::new(turns));
    let notices = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        config: test_config(),
        backend: backend.clone(),
        interpreter: interpreter.clone(),
        session: Session::signed_in(Credential::bearer(token)),
        notifier: Box::new(RecordingNotifier {
            notices: Arc::clone(&notices),
        }),
        views: StaleViews::new(),
        catalog: SlotCatalog::standard(),
        clock: Arc::new(FixedClock(today())),
    });
    Harness {
        state,
        backend,
        interpreter,
        notices,
    }
}

pub fn harness() -> Harness {
    harness_with(TOKEN, vec![])
}
