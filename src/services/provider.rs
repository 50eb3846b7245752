use std::sync::Arc;

use crate::errors::{BookingError, Result};
use crate::models::{Booking, BookingStatus, ProviderStatus};
use crate::services::booking_form::notify_error;
use crate::services::coordinator::BookingCoordinator;
use crate::services::notify::Notice;
use crate::services::views::ViewKey;
use crate::state::AppState;

/// A service provider's view of the bookings assigned to them.
pub struct ProviderDesk {
    coordinator: BookingCoordinator,
    cached: Option<Vec<Booking>>,
}

impl ProviderDesk {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            coordinator: BookingCoordinator::new(state),
            cached: None,
        }
    }

    pub async fn refresh(&mut self) -> Result<()> {
        match self.coordinator.assigned_bookings().await {
            Ok(bookings) => {
                tracing::debug!(count = bookings.len(), "assigned bookings loaded");
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
        let stale = self
            .coordinator
            .state()
            .views
            .is_stale(&ViewKey::AssignedBookings);
        if self.cached.is_none() || stale {
            self.refresh().await?;
        }
        Ok(self.cached.as_deref().unwrap_or(&[]))
    }

    pub async fn update_status(&mut self, booking_id: &str, status: ProviderStatus) -> Result<()> {
        let booking = self
            .bookings()
            .await?
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))?;

        match self.coordinator.update_status(&booking, status).await {
            Ok(_) => {
                self.coordinator.state().notifier.notify(Notice::success(
                    "Status updated",
                    format!(
                        "Booking {booking_id} is now {}.",
                        BookingStatus::from(status).label()
                    ),
                ));
                Ok(())
            }
            Err(e) => {
                notify_error(&self.coordinator, "Status Update Failed", &e);
                Err(e)
            }
        }
    }
}
