use std::sync::Arc;

use chrono::NaiveDate;

use crate::errors::{BookingError, Result};
use crate::models::Booking;
use crate::services::booking_form::{after_failed_submit, notify_error, notify_load_failed};
use crate::services::booking_intent::BookingIntent;
use crate::services::coordinator::BookingCoordinator;
use crate::services::notify::Notice;
use crate::state::AppState;

/// Moves an existing booking to another date and slot of the same service.
pub struct RescheduleDialog {
    coordinator: BookingCoordinator,
    booking: Booking,
    intent: BookingIntent,
}

impl RescheduleDialog {
    pub fn new(state: Arc<AppState>, booking: Booking) -> Result<Self> {
        if !booking.actions().can_reschedule {
            return Err(BookingError::validation(format!(
                "Bookings that are {} cannot be rescheduled.",
                booking.status.label()
            )));
        }
        Ok(Self {
            coordinator: BookingCoordinator::new(state),
            intent: BookingIntent::for_reschedule(&booking),
            booking,
        })
    }

    pub fn booking(&self) -> &Booking {
        &self.booking
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

    pub async fn submit(&mut self) -> Result<Booking> {
        match self
            .coordinator
            .reschedule(&self.booking, &mut self.intent)
            .await
        {
            Ok(updated) => {
                self.coordinator.state().notifier.notify(Notice::success(
                    "Booking rescheduled",
                    format!(
                        "Your {} booking was moved to {} at {}.",
                        self.booking.service.name, updated.date, updated.time_slot
                    ),
                ));
                self.booking = updated.clone();
                Ok(updated)
            }
            Err(e) => {
                after_failed_submit(&self.coordinator, &mut self.intent, &e, "Reschedule Failed")
                    .await;
                Err(e)
            }
        }
    }
}
