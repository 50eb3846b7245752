use std::sync::Arc;

use chrono::NaiveDate;

use crate::errors::{BookingError, Result};
use crate::models::{Booking, ServiceCatalogEntry};
use crate::services::booking_intent::BookingIntent;
use crate::services::coordinator::BookingCoordinator;
use crate::services::notify::Notice;
use crate::state::AppState;

pub(crate) const LOAD_FAILED: &str = "Failed to load unavailable time slots.";

/// The manual booking form for one service.
pub struct BookingForm {
    coordinator: BookingCoordinator,
    service: ServiceCatalogEntry,
    intent: BookingIntent,
}

impl BookingForm {
    pub fn new(state: Arc<AppState>, service: ServiceCatalogEntry) -> Self {
        Self {
            coordinator: BookingCoordinator::new(state),
            intent: BookingIntent::new(service.id.clone()),
            service,
        }
    }

    pub fn service(&self) -> &ServiceCatalogEntry {
        &self.service
    }

    pub fn intent(&self) -> &BookingIntent {
        &self.intent
    }

    pub async fn select_date(&mut self, date: NaiveDate) -> Result<()> {
        if let Err(e) = self.coordinator.select_date(&mut self.intent, date) {
            notify_error(&self.coordinator, "Invalid Date", &e);
            return Err(e);
        }
        self.reload().await
    }

    pub async fn reload(&mut self) -> Result<()> {
        let result = self.coordinator.load_slots(&mut self.intent).await;
        if let Err(e) = &result {
            notify_load_failed(&self.coordinator, e);
        }
        result
    }

    pub async fn choose_slot(&mut self, slot: &str) -> Result<()> {
        self.coordinator.select_slot(&mut self.intent, slot).await
    }

    pub fn set_instructions(&mut self, text: &str) {
        self.intent.set_instructions(text);
    }

    pub async fn submit(&mut self) -> Result<Booking> {
        match self.coordinator.submit(&mut self.intent).await {
            Ok(booking) => {
                self.coordinator.state().notifier.notify(Notice::success(
                    "Booking Confirmed!",
                    format!(
                        "Your {} booking for {} at {} has been confirmed.",
                        self.service.name, booking.date, booking.time_slot
                    ),
                ));
                Ok(booking)
            }
            Err(e) => {
                after_failed_submit(&self.coordinator, &mut self.intent, &e, "Booking Failed")
                    .await;
                Err(e)
            }
        }
    }

    /// Starts over for the same service after a confirmed booking.
    pub fn reset(&mut self) {
        self.intent = BookingIntent::new(self.service.id.clone());
    }
}

/// Shared by the form and the reschedule dialog: report the failure, then leave the
/// intent usable again. A conflict reloads availability instead of retrying blindly.
pub(crate) async fn after_failed_submit(
    coordinator: &BookingCoordinator,
    intent: &mut BookingIntent,
    err: &BookingError,
    title: &str,
) {
    match err {
        BookingError::Validation(_) => {
            notify_error(coordinator, "Missing Information", err);
        }
        BookingError::SlotTaken { date, time_slot } => {
            coordinator.state().notifier.notify(Notice::error(
                "Slot No Longer Available",
                format!("The {time_slot} slot on {date} was just booked. Please pick another time."),
            ));
            if let Err(e) = coordinator.recover(intent).await {
                notify_load_failed(coordinator, &e);
            }
        }
        _ => {
            notify_error(coordinator, title, err);
            if intent.is_terminal() {
                *intent = intent.retry();
            }
        }
    }
}

pub(crate) fn notify_load_failed(coordinator: &BookingCoordinator, err: &BookingError) {
    match err {
        BookingError::Unauthorized | BookingError::Validation(_) => {
            notify_error(coordinator, "Error", err)
        }
        _ => coordinator
            .state()
            .notifier
            .notify(Notice::error("Error", LOAD_FAILED)),
    }
}

pub(crate) fn notify_error(coordinator: &BookingCoordinator, title: &str, err: &BookingError) {
    let description = match err {
        BookingError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
        BookingError::Validation(msg) => msg.clone(),
        other if other.is_transient() => format!("{other}. Please try again."),
        other => other.to_string(),
    };
    coordinator
        .state()
        .notifier
        .notify(Notice::error(title, description));
}
