use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::BookingBackend;
use crate::config::AppConfig;
use crate::errors::{BookingError, Result};
use crate::models::{
    Ack, Booking, LoginRequest, LoginResponse, NewBooking, RatingRequest, RescheduleRequest,
    ResidentNotification, ServiceCatalogEntry, SlotQuery, StatusUpdate, UnavailabilitySet,
    UnavailableSlotsResponse, UserProfile,
};
use crate::session::Credential;

/// Substring the backend uses when the unique (service, date, slot) constraint trips.
const ALREADY_BOOKED_MARKER: &str = "already booked";

pub struct HttpBackend {
    api_base: String,
    ai_base: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(api_base: &str, ai_base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            ai_base: ai_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            &config.ai_base_url,
            config.request_timeout(),
        )
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub(crate) fn ai_url(&self, path: &str) -> String {
        format!("{}{}", self.ai_base, path)
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn service_by_name_url(&self, name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.ai_url("/services/by-name/"))
            .map_err(|e| BookingError::validation(format!("invalid assistant url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BookingError::validation("assistant url cannot carry a path"))?
            .pop_if_empty()
            .push(name)
            .push("");
        Ok(url)
    }

    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        cred: &Credential,
    ) -> Result<T> {
        self.execute(request.bearer_auth(cred.token())).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "backend request failed");
        Err(error_for_status(status, &body))
    }
}

pub(crate) fn error_for_status(status: StatusCode, body: &str) -> BookingError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "detail", "message"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(|m| m.to_string()))
        })
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED => BookingError::Unauthorized,
        StatusCode::NOT_FOUND => BookingError::NotFound(message),
        StatusCode::FORBIDDEN => BookingError::Forbidden(message),
        _ => BookingError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Rewrites the backend's "slot already taken" rejection into the domain conflict.
fn as_conflict(err: BookingError, date: &chrono::NaiveDate, time_slot: &str) -> BookingError {
    match err {
        BookingError::Api { status, ref message }
            if status == StatusCode::CONFLICT.as_u16()
                || (status == StatusCode::BAD_REQUEST.as_u16()
                    && message.to_lowercase().contains(ALREADY_BOOKED_MARKER)) =>
        {
            BookingError::SlotTaken {
                date: date.format("%Y-%m-%d").to_string(),
                time_slot: time_slot.to_string(),
            }
        }
        other => other,
    }
}

#[async_trait]
impl BookingBackend for HttpBackend {
    async fn list_services(&self, cred: &Credential) -> Result<Vec<ServiceCatalogEntry>> {
        self.send(self.client.get(self.api_url("/services")), cred)
            .await
    }

    async fn find_service_by_name(
        &self,
        cred: &Credential,
        name: &str,
    ) -> Result<Option<ServiceCatalogEntry>> {
        let url = self.service_by_name_url(name.trim())?;
        match self.send(self.client.get(url), cred).await {
            Ok(service) => Ok(Some(service)),
            Err(BookingError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn unavailable_slots(
        &self,
        cred: &Credential,
        query: &SlotQuery,
    ) -> Result<UnavailabilitySet> {
        let request = self
            .client
            .get(self.api_url("/bookings/availability"))
            .query(&[
                ("service_id", query.service_id.as_str()),
                ("date", query.date_param().as_str()),
            ]);
        let resp: UnavailableSlotsResponse = self.send(request, cred).await?;
        Ok(resp.into())
    }

    async fn create_booking(&self, cred: &Credential, booking: &NewBooking) -> Result<Booking> {
        let request = self.client.post(self.api_url("/bookings")).json(booking);
        self.send(request, cred)
            .await
            .map_err(|e| as_conflict(e, &booking.date, &booking.time_slot))
    }

    async fn reschedule_booking(
        &self,
        cred: &Credential,
        booking: &Booking,
        request: &RescheduleRequest,
    ) -> Result<Booking> {
        let url = self.api_url(&format!("/bookings/{}/reschedule", booking.id));
        let body: serde_json::Value = self
            .send(self.client.put(url).json(request), cred)
            .await
            .map_err(|e| as_conflict(e, &request.date, &request.time_slot))?;

        // Older backends answer with a bare acknowledgement instead of the record.
        Ok(serde_json::from_value::<Booking>(body).unwrap_or_else(|_| Booking {
            date: request.date,
            time_slot: request.time_slot.clone(),
            ..booking.clone()
        }))
    }

    async fn cancel_booking(&self, cred: &Credential, booking_id: &str) -> Result<Ack> {
        let url = self.api_url(&format!("/bookings/{booking_id}/cancel"));
        self.send(self.client.put(url), cred).await
    }

    async fn my_bookings(&self, cred: &Credential) -> Result<Vec<Booking>> {
        self.send(self.client.get(self.api_url("/bookings/my")), cred)
            .await
    }

    async fn rate_booking(
        &self,
        cred: &Credential,
        booking_id: &str,
        rating: &RatingRequest,
    ) -> Result<Ack> {
        let url = self.api_url(&format!("/bookings/{booking_id}/rate"));
        self.send(self.client.post(url).json(rating), cred).await
    }

    async fn profile(&self, cred: &Credential) -> Result<UserProfile> {
        self.send(self.client.get(self.api_url("/auth/profile")), cred)
            .await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let post = self.client.post(self.api_url("/auth/login")).json(request);
        match self.execute(post).await {
            Err(BookingError::Unauthorized) | Err(BookingError::Api { status: 400, .. }) => Err(
                BookingError::validation("Invalid email or password."),
            ),
            other => other,
        }
    }

    async fn assigned_bookings(&self, cred: &Credential) -> Result<Vec<Booking>> {
        self.send(
            self.client.get(self.api_url("/service-provider/bookings")),
            cred,
        )
        .await
    }

    async fn update_booking_status(
        &self,
        cred: &Credential,
        booking_id: &str,
        update: &StatusUpdate,
    ) -> Result<Ack> {
        let url = self.api_url(&format!("/service-provider/bookings/{booking_id}/status"));
        self.send(self.client.put(url).json(update), cred).await
    }

    async fn notifications(&self, cred: &Credential) -> Result<Vec<ResidentNotification>> {
        self.send(self.client.get(self.api_url("/notifications/user")), cred)
            .await
    }

    async fn mark_notification_read(
        &self,
        cred: &Credential,
        notification_id: &str,
    ) -> Result<Ack> {
        let url = self.api_url(&format!("/notifications/{notification_id}/read"));
        self.send(self.client.put(url), cred).await
    }
}
