use std::sync::Arc;

use chrono::NaiveDate;

use crate::errors::{BookingError, Result};
use crate::models::{
    Ack, Booking, BookingStatus, LoginRequest, ProviderStatus, RatingRequest, RescheduleRequest,
    ResidentNotification, ServiceCatalogEntry, SlotCatalog, SlotQuery, StatusUpdate,
    UserProfile,
};
use crate::services::availability::{AvailabilityResolver, Resolution};
use crate::services::booking_intent::BookingIntent;
use crate::services::views::ViewKey;
use crate::session::Credential;
use crate::state::AppState;

/// The booking rules every call site goes through. Each call site owns one
/// coordinator, so each has its own availability request token.
pub struct BookingCoordinator {
    state: Arc<AppState>,
    resolver: AvailabilityResolver,
}

impl BookingCoordinator {
    pub fn new(state: Arc<AppState>) -> Self {
        let resolver = AvailabilityResolver::new(Arc::clone(&state.backend), state.catalog.clone());
        Self { state, resolver }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn catalog(&self) -> &SlotCatalog {
        self.resolver.catalog()
    }

    pub fn today(&self) -> NaiveDate {
        self.state.clock.today()
    }

    fn credential(&self) -> Result<Credential> {
        self.state.session.guard(self.state.session.credential())
    }

    pub fn select_date(&self, intent: &mut BookingIntent, date: NaiveDate) -> Result<()> {
        // Anything still in flight belongs to the old date.
        self.resolver.invalidate();
        intent.select_date(date, self.today())
    }

    /// Fetches availability without touching any intent. Callers that issue several
    /// fetches concurrently get `Superseded` for all but the latest.
    pub async fn fetch_slots(&self, query: SlotQuery) -> Result<Resolution> {
        let cred = self.credential()?;
        let generation = self
            .state
            .views
            .generation(&ViewKey::Availability(query.clone()));
        let result = self.resolver.resolve(&cred, query).await;
        self.state
            .session
            .guard(result)
            .map(|r| r.at_generation(generation))
    }

    pub fn apply_slots(
        &self,
        intent: &mut BookingIntent,
        query: &SlotQuery,
        result: Result<Resolution>,
    ) -> Result<()> {
        match result {
            Ok(Resolution::Current(resolved)) => {
                if intent.apply_slots(resolved) {
                    self.state
                        .views
                        .mark_fresh(&ViewKey::Availability(query.clone()));
                }
                Ok(())
            }
            Ok(Resolution::Superseded) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    service_id = %query.service_id,
                    date = %query.date,
                    error = %e,
                    "failed to load availability"
                );
                intent.slots_failed(query);
                Err(e)
            }
        }
    }

    pub async fn load_slots(&self, intent: &mut BookingIntent) -> Result<()> {
        let query = intent.begin_loading()?;
        let result = self.fetch_slots(query.clone()).await;
        self.apply_slots(intent, &query, result)
    }

    /// True when some call site changed this intent's (service, date) after its slot
    /// list was loaded.
    pub fn is_outdated(&self, intent: &BookingIntent) -> bool {
        match (intent.query(), intent.slots_generation()) {
            (Some(query), Some(loaded)) => {
                self.state.views.generation(&ViewKey::Availability(query)) != loaded
            }
            _ => false,
        }
    }

    /// Picks a slot, re-fetching first if the loaded list can no longer be trusted.
    pub async fn select_slot(&self, intent: &mut BookingIntent, slot: &str) -> Result<()> {
        if self.is_outdated(intent) {
            tracing::debug!(
                service_id = %intent.service_id(),
                slot,
                "availability changed since it was loaded; reloading"
            );
            self.load_slots(intent).await?;
        }
        intent.select_slot(slot)
    }

    /// Reloads an outdated slot list before submitting. A chosen slot that is gone
    /// afterwards is reported as taken without ever reaching the backend.
    async fn revalidate(&self, intent: &mut BookingIntent) -> Result<()> {
        if !self.is_outdated(intent) {
            return Ok(());
        }
        let chosen = intent.time_slot().map(str::to_string);
        self.load_slots(intent).await?;
        match (chosen, intent.time_slot(), intent.date()) {
            (Some(time_slot), None, Some(date)) => {
                tracing::info!(
                    service_id = %intent.service_id(),
                    date = %date,
                    time_slot = %time_slot,
                    "chosen slot was taken elsewhere; not submitting"
                );
                Err(BookingError::SlotTaken {
                    date: date.to_string(),
                    time_slot,
                })
            }
            _ => Ok(()),
        }
    }

    /// Replaces a finished intent with a fresh one for the same choices and reloads
    /// availability, so a taken slot is dropped rather than resubmitted. An intent
    /// that never left the client and is already current is left alone.
    pub async fn recover(&self, intent: &mut BookingIntent) -> Result<()> {
        if !intent.is_terminal() && !self.is_outdated(intent) {
            return Ok(());
        }
        *intent = intent.retry();
        if intent.date().is_some() {
            self.load_slots(intent).await?;
        }
        Ok(())
    }

    pub async fn submit(&self, intent: &mut BookingIntent) -> Result<Booking> {
        if intent.rescheduling().is_some() {
            return Err(BookingError::validation(
                "This request changes an existing booking; reschedule it instead.",
            ));
        }
        let cred = self.credential()?;
        self.revalidate(intent).await?;
        let submission = intent.begin_submit()?;
        let body = submission.to_new_booking();

        let result = self.state.backend.create_booking(&cred, &body).await;
        match self.state.session.guard(result) {
            Ok(booking) => {
                intent.confirm();
                tracing::info!(
                    booking_id = %booking.id,
                    service_id = %body.service_id,
                    date = %body.date,
                    time_slot = %body.time_slot,
                    "booking created"
                );
                self.state
                    .views
                    .mark_stale(ViewKey::Availability(submission.query));
                self.state.views.mark_stale(ViewKey::BookingList);
                Ok(booking)
            }
            Err(e) => {
                intent.fail();
                if matches!(e, BookingError::SlotTaken { .. }) {
                    tracing::info!(
                        service_id = %body.service_id,
                        date = %body.date,
                        time_slot = %body.time_slot,
                        "slot was taken before submission"
                    );
                    self.state
                        .views
                        .mark_stale(ViewKey::Availability(submission.query));
                }
                Err(e)
            }
        }
    }

    pub async fn reschedule(&self, booking: &Booking, intent: &mut BookingIntent) -> Result<Booking> {
        if !booking.actions().can_reschedule {
            return Err(BookingError::validation(format!(
                "Bookings that are {} cannot be rescheduled.",
                booking.status.label()
            )));
        }
        if intent.rescheduling() != Some(booking.id.as_str())
            || intent.service_id() != booking.service.id
        {
            return Err(BookingError::validation(
                "A booking can only be moved within its own service.",
            ));
        }

        let cred = self.credential()?;
        self.revalidate(intent).await?;
        let submission = intent.begin_submit()?;
        let request = RescheduleRequest {
            date: submission.query.date,
            time_slot: submission.time_slot.clone(),
        };

        let result = self
            .state
            .backend
            .reschedule_booking(&cred, booking, &request)
            .await;
        match self.state.session.guard(result) {
            Ok(updated) => {
                intent.confirm();
                tracing::info!(
                    booking_id = %booking.id,
                    from = %booking.date,
                    to = %request.date,
                    time_slot = %request.time_slot,
                    "booking rescheduled"
                );
                let views = &self.state.views;
                views.mark_stale(ViewKey::Availability(SlotQuery::new(
                    booking.service.id.clone(),
                    booking.date,
                )));
                views.mark_stale(ViewKey::Availability(submission.query));
                views.mark_stale(ViewKey::Booking(booking.id.clone()));
                views.mark_stale(ViewKey::BookingList);
                Ok(updated)
            }
            Err(e) => {
                intent.fail();
                if matches!(e, BookingError::SlotTaken { .. }) {
                    self.state
                        .views
                        .mark_stale(ViewKey::Availability(submission.query));
                }
                Err(e)
            }
        }
    }

    pub async fn cancel(&self, booking: &Booking) -> Result<Ack> {
        if !booking.actions().can_cancel {
            return Err(BookingError::validation(format!(
                "Bookings that are {} cannot be cancelled.",
                booking.status.label()
            )));
        }
        let cred = self.credential()?;
        let result = self.state.backend.cancel_booking(&cred, &booking.id).await;
        let ack = self.state.session.guard(result)?;

        tracing::info!(booking_id = %booking.id, "booking cancelled");
        let views = &self.state.views;
        views.mark_stale(ViewKey::Availability(SlotQuery::new(
            booking.service.id.clone(),
            booking.date,
        )));
        views.mark_stale(ViewKey::Booking(booking.id.clone()));
        views.mark_stale(ViewKey::BookingList);
        Ok(ack)
    }

    pub async fn rate(&self, booking: &Booking, rating: u8, comment: Option<String>) -> Result<Ack> {
        if !booking.actions().can_rate {
            return Err(BookingError::validation(
                "Only completed bookings that have not been rated can be rated.",
            ));
        }
        let request = RatingRequest::new(rating, comment)?;
        let cred = self.credential()?;
        let result = self
            .state
            .backend
            .rate_booking(&cred, &booking.id, &request)
            .await;
        let ack = self.state.session.guard(result)?;

        tracing::info!(booking_id = %booking.id, rating, "booking rated");
        self.state
            .views
            .mark_stale(ViewKey::Booking(booking.id.clone()));
        self.state.views.mark_stale(ViewKey::BookingList);
        Ok(ack)
    }

    /// Maps a free-text service name to a catalog entry.
    pub async fn resolve_service(&self, name: &str) -> Result<ServiceCatalogEntry> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BookingError::UnknownService(String::new()));
        }
        let cred = self.credential()?;
        let result = self.state.backend.find_service_by_name(&cred, name).await;
        self.state
            .session
            .guard(result)?
            .ok_or_else(|| BookingError::UnknownService(name.to_string()))
    }

    pub async fn services(&self) -> Result<Vec<ServiceCatalogEntry>> {
        let cred = self.credential()?;
        let result = self.state.backend.list_services(&cred).await;
        self.state.session.guard(result)
    }

    pub async fn my_bookings(&self) -> Result<Vec<Booking>> {
        let cred = self.credential()?;
        let result = self.state.backend.my_bookings(&cred).await;
        let bookings = self.state.session.guard(result)?;
        self.state.views.mark_fresh(&ViewKey::BookingList);
        Ok(bookings)
    }

    /// Exchanges email and password for a credential and signs the session in.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(BookingError::validation("Please enter your email and password."));
        }
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.state.backend.login(&request).await?;

        tracing::info!(user_id = %resp.user.id, "signed in");
        self.state
            .session
            .sign_in(Credential::bearer(resp.access_token), Some(resp.user.clone()));
        // Anything cached so far belonged to whoever was signed in before.
        let views = &self.state.views;
        views.mark_stale(ViewKey::BookingList);
        views.mark_stale(ViewKey::AssignedBookings);
        views.mark_stale(ViewKey::Notifications);
        Ok(resp.user)
    }

    pub async fn assigned_bookings(&self) -> Result<Vec<Booking>> {
        let cred = self.credential()?;
        let result = self.state.backend.assigned_bookings(&cred).await;
        let bookings = self.state.session.guard(result)?;
        self.state.views.mark_fresh(&ViewKey::AssignedBookings);
        Ok(bookings)
    }

    pub async fn update_status(&self, booking: &Booking, status: ProviderStatus) -> Result<Ack> {
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::validation(
                "Cancelled bookings cannot change status.",
            ));
        }
        let cred = self.credential()?;
        let update = StatusUpdate { status };
        let result = self
            .state
            .backend
            .update_booking_status(&cred, &booking.id, &update)
            .await;
        let ack = self.state.session.guard(result)?;

        tracing::info!(booking_id = %booking.id, status = ?status, "booking status updated");
        let views = &self.state.views;
        views.mark_stale(ViewKey::Booking(booking.id.clone()));
        views.mark_stale(ViewKey::BookingList);
        views.mark_stale(ViewKey::AssignedBookings);
        Ok(ack)
    }

    pub async fn notifications(&self) -> Result<Vec<ResidentNotification>> {
        let cred = self.credential()?;
        let result = self.state.backend.notifications(&cred).await;
        let notifications = self.state.session.guard(result)?;
        self.state.views.mark_fresh(&ViewKey::Notifications);
        Ok(notifications)
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<Ack> {
        let cred = self.credential()?;
        let result = self
            .state
            .backend
            .mark_notification_read(&cred, notification_id)
            .await;
        let ack = self.state.session.guard(result)?;
        self.state.views.mark_stale(ViewKey::Notifications);
        Ok(ack)
    }
}
