use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::service::ServiceCatalogEntry;
use super::wire;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub user: Option<String>,
    pub service: ServiceCatalogEntry,
    pub date: NaiveDate,
    pub time_slot: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub room_number: Option<String>,
}

/// Server-owned status. Transitions are the backend's business; unknown values are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Booked,
    InProgress,
    Completed,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Booked => "Booked",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().replace(' ', "_").as_str() {
            "booked" => BookingStatus::Booked,
            "in_progress" => BookingStatus::InProgress,
            "completed" => BookingStatus::Completed,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(s.to_string()),
        }
    }

    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl From<String> for BookingStatus {
    fn from(s: String) -> Self {
        BookingStatus::parse(&s)
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        status.as_str().to_string()
    }
}

/// What the client lets a resident do with a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookingActions {
    pub can_reschedule: bool,
    pub can_cancel: bool,
    pub can_rate: bool,
}

impl Booking {
    pub fn actions(&self) -> BookingActions {
        match self.status {
            BookingStatus::Booked => BookingActions {
                can_reschedule: true,
                can_cancel: true,
                can_rate: false,
            },
            BookingStatus::Completed => BookingActions {
                can_rate: self.rating.is_none(),
                ..Default::default()
            },
            _ => BookingActions::default(),
        }
    }
}

/// Body of `POST /bookings`. Identity comes from the credential, never from the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub service_id: String,
    pub date: NaiveDate,
    pub time_slot: String,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RatingRequest {
    pub fn new(rating: u8, comment: Option<String>) -> crate::errors::Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(crate::errors::BookingError::validation(
                "Please select a rating between 1 and 5.",
            ));
        }
        Ok(Self {
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// The only statuses a service provider may set on an assigned booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    InProgress,
    Completed,
}

impl ProviderStatus {
    pub fn parse(s: &str) -> crate::errors::Result<Self> {
        match s.trim().to_ascii_lowercase().replace(|c: char| c == ' ' || c == '-', "_").as_str() {
            "in_progress" => Ok(ProviderStatus::InProgress),
            "completed" => Ok(ProviderStatus::Completed),
            _ => Err(crate::errors::BookingError::validation(format!(
                "Invalid status \"{s}\": use in_progress or completed."
            ))),
        }
    }
}

impl From<ProviderStatus> for BookingStatus {
    fn from(status: ProviderStatus) -> Self {
        match status {
            ProviderStatus::InProgress => BookingStatus::InProgress,
            ProviderStatus::Completed => BookingStatus::Completed,
        }
    }
}

/// Body of `PUT /service-provider/bookings/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ProviderStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}
