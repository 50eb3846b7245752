use std::sync::Arc;

use crate::errors::{BookingError, Result};
use crate::models::Booking;
use crate::services::booking_form::notify_error;
use crate::services::coordinator::BookingCoordinator;
use crate::services::notify::Notice;
use crate::services::reschedule::RescheduleDialog;
use crate::services::views::ViewKey;
use crate::state::AppState;

/// The resident's own bookings, cached until a mutation marks the list stale.
pub struct BookingHistory {
    coordinator: BookingCoordinator,
    cached: Option<Vec<Booking>>,
}

impl BookingHistory {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            coordinator: BookingCoordinator::new(state),
            cached: None,
        }
    }

    fn needs_refresh(&self) -> bool {
        self.cached.is_none() || self.coordinator.state().views.is_stale(&ViewKey::BookingList)
    }

    pub async fn refresh(&mut self) -> Result<()> {
        match self.coordinator.my_bookings().await {
            Ok(bookings) => {
                tracing::debug!(count = bookings.len(), "booking list loaded");
                self.cached = Some(bookings);
                Ok(())
            }
            Err(e) => {
                notify_error(&self.coordinator, "Failed to load bookings", &e);
                Err(e)
            }
        }
    }

    pub async fn bookings(&mut self) -> Result<&[Booking]> {
        if self.needs_refresh() {
            self.refresh().await?;
        }
        Ok(self.cached.as_deref().unwrap_or(&[]))
    }

    async fn find(&mut self, booking_id: &str) -> Result<Booking> {
        let booking_view = ViewKey::Booking(booking_id.to_string());
        if self.coordinator.state().views.is_stale(&booking_view) {
            self.refresh().await?;
            self.coordinator.state().views.mark_fresh(&booking_view);
        }
        self.bookings()
            .await?
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))
    }

    pub async fn cancel(&mut self, booking_id: &str) -> Result<()> {
        let booking = self.find(booking_id).await?;
        match self.coordinator.cancel(&booking).await {
            Ok(ack) => {
                self.coordinator.state().notifier.notify(Notice::success(
                    "Booking cancelled",
                    ack.message
                        .unwrap_or_else(|| "Your booking has been cancelled.".to_string()),
                ));
                Ok(())
            }
            Err(e) => {
                notify_error(&self.coordinator, "Cancellation Failed", &e);
                Err(e)
            }
        }
    }

    pub async fn rate(&mut self, booking_id: &str, rating: u8, comment: Option<String>) -> Result<()> {
        let booking = self.find(booking_id).await?;
        match self.coordinator.rate(&booking, rating, comment).await {
            Ok(_) => {
                self.coordinator.state().notifier.notify(Notice::success(
                    "Review Submitted!",
                    "Thank you for your feedback.",
                ));
                Ok(())
            }
            Err(e) => {
                notify_error(&self.coordinator, "Review Failed", &e);
                Err(e)
            }
        }
    }

    pub async fn reschedule_dialog(&mut self, booking_id: &str) -> Result<RescheduleDialog> {
        let booking = self.find(booking_id).await?;
        RescheduleDialog::new(Arc::clone(self.coordinator.state()), booking)
    }
}
