use std::sync::Arc;

use crate::errors::Result;
use crate::models::ResidentNotification;
use crate::services::booking_form::notify_error;
use crate::services::coordinator::BookingCoordinator;
use crate::services::views::ViewKey;
use crate::state::AppState;

/// The resident's notification feed.
pub struct NotificationInbox {
    coordinator: BookingCoordinator,
    cached: Option<Vec<ResidentNotification>>,
}

impl NotificationInbox {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            coordinator: BookingCoordinator::new(state),
            cached: None,
        }
    }

    pub async fn notifications(&mut self) -> Result<&[ResidentNotification]> {
        let stale = self
            .coordinator
            .state()
            .views
            .is_stale(&ViewKey::Notifications);
        if self.cached.is_none() || stale {
            match self.coordinator.notifications().await {
                Ok(list) => self.cached = Some(list),
                Err(e) => {
                    notify_error(&self.coordinator, "Failed to load notifications", &e);
                    return Err(e);
                }
            }
        }
        Ok(self.cached.as_deref().unwrap_or(&[]))
    }

    /// Marking an already-read notification is a no-op.
    pub async fn mark_read(&mut self, notification_id: &str) -> Result<()> {
        let already_read = self
            .cached
            .as_ref()
            .and_then(|list| list.iter().find(|n| n.id == notification_id))
            .map(|n| n.read)
            .unwrap_or(false);
        if already_read {
            return Ok(());
        }

        if let Err(e) = self.coordinator.mark_notification_read(notification_id).await {
            notify_error(&self.coordinator, "Error", &e);
            return Err(e);
        }
        if let Some(entry) = self
            .cached
            .as_mut()
            .and_then(|list| list.iter_mut().find(|n| n.id == notification_id))
        {
            entry.read = true;
        }
        Ok(())
    }
}
