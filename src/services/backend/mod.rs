pub mod http;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{
    Ack, Booking, LoginRequest, LoginResponse, NewBooking, RatingRequest, RescheduleRequest,
    ResidentNotification, ServiceCatalogEntry, SlotQuery, StatusUpdate, UnavailabilitySet,
    UserProfile,
};
use crate::session::Credential;

pub use http::HttpBackend;

/// The backend endpoints the booking core consumes.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn list_services(&self, cred: &Credential) -> Result<Vec<ServiceCatalogEntry>>;

    /// `Ok(None)` when no service has that name.
    async fn find_service_by_name(
        &self,
        cred: &Credential,
        name: &str,
    ) -> Result<Option<ServiceCatalogEntry>>;

    async fn unavailable_slots(&self, cred: &Credential, query: &SlotQuery)
        -> Result<UnavailabilitySet>;

    async fn create_booking(&self, cred: &Credential, booking: &NewBooking) -> Result<Booking>;

    async fn reschedule_booking(
        &self,
        cred: &Credential,
        booking: &Booking,
        request: &RescheduleRequest,
    ) -> Result<Booking>;

    async fn cancel_booking(&self, cred: &Credential, booking_id: &str) -> Result<Ack>;

    async fn my_bookings(&self, cred: &Credential) -> Result<Vec<Booking>>;

    async fn rate_booking(
        &self,
        cred: &Credential,
        booking_id: &str,
        rating: &RatingRequest,
    ) -> Result<Ack>;

    async fn profile(&self, cred: &Credential) -> Result<UserProfile>;

    /// The only unauthenticated call. Bad credentials come back as `Validation`.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// Bookings of the services the signed-in provider runs.
    async fn assigned_bookings(&self, cred: &Credential) -> Result<Vec<Booking>>;

    async fn update_booking_status(
        &self,
        cred: &Credential,
        booking_id: &str,
        update: &StatusUpdate,
    ) -> Result<Ack>;

    async fn notifications(&self, cred: &Credential) -> Result<Vec<ResidentNotification>>;

    async fn mark_notification_read(&self, cred: &Credential, notification_id: &str)
        -> Result<Ack>;
}
