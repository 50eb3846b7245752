use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub slot: String,
    pub available: bool,
}

/// Wire shape of `GET /bookings/availability`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnavailableSlotsResponse {
    #[serde(default)]
    pub unavailable_slots: Vec<String>,
}

/// Taken slots for exactly one (service, date) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnavailabilitySet {
    slots: HashSet<String>,
}

impl UnavailabilitySet {
    pub fn contains(&self, slot: &str) -> bool {
        self.slots.contains(slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for UnavailabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().map(|s| s.into().trim().to_string()).collect(),
        }
    }
}

impl From<UnavailableSlotsResponse> for UnavailabilitySet {
    fn from(resp: UnavailableSlotsResponse) -> Self {
        resp.unavailable_slots.into_iter().collect()
    }
}

/// The (service, date) pair an availability result belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotQuery {
    pub service_id: String,
    pub date: NaiveDate,
}

impl SlotQuery {
    pub fn new(service_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            service_id: service_id.into(),
            date,
        }
    }

    pub fn date_param(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

pub fn offered_slots(slots: &[SlotAvailability]) -> Vec<&str> {
    slots
        .iter()
        .filter(|s| s.available)
        .map(|s| s.slot.as_str())
        .collect()
}

pub fn is_offered(slots: &[SlotAvailability], slot: &str) -> bool {
    slots.iter().any(|s| s.available && s.slot == slot)
}

/// Conversational rendering of a resolved slot list.
pub fn describe_offered(service_name: &str, date: &NaiveDate, slots: &[SlotAvailability]) -> String {
    let offered = offered_slots(slots);
    let date = date.format("%Y-%m-%d");
    if offered.is_empty() {
        format!("Sorry, no slots are available for {service_name} on {date}.")
    } else {
        format!(
            "Available slots for {service_name} on {date}: {}. Please pick one.",
            offered.join(", ")
        )
    }
}
