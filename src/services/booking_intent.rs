use chrono::NaiveDate;

use crate::errors::{BookingError, Result};
use crate::models::{is_offered, Booking, NewBooking, SlotAvailability, SlotQuery};
use crate::services::availability::ResolvedSlots;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentState {
    Empty,
    DateSelected,
    SlotsLoading,
    SlotsReady,
    SlotSelected,
    Submitting,
    Confirmed,
    Failed,
}

/// A draft booking (or reschedule) that has not been submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingIntent {
    service_id: String,
    date: Option<NaiveDate>,
    slots: Option<Vec<SlotAvailability>>,
    slots_generation: Option<u64>,
    time_slot: Option<String>,
    instructions: Option<String>,
    rescheduling: Option<String>,
    state: IntentState,
}

/// What leaves the client when an intent is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub query: SlotQuery,
    pub time_slot: String,
    pub instructions: Option<String>,
}

impl Submission {
    pub fn to_new_booking(&self) -> NewBooking {
        NewBooking {
            service_id: self.query.service_id.clone(),
            date: self.query.date,
            time_slot: self.time_slot.clone(),
            special_instructions: self.instructions.clone().unwrap_or_default(),
        }
    }
}

impl BookingIntent {
    pub fn new(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            date: None,
            slots: None,
            slots_generation: None,
            time_slot: None,
            instructions: None,
            rescheduling: None,
            state: IntentState::Empty,
        }
    }

    /// Rescheduling is always scoped to the existing booking's service.
    pub fn for_reschedule(booking: &Booking) -> Self {
        Self {
            rescheduling: Some(booking.id.clone()),
            ..Self::new(booking.service.id.clone())
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// `None` while unknown: before the first fetch, while loading, or after a failed fetch.
    pub fn slots(&self) -> Option<&[SlotAvailability]> {
        self.slots.as_deref()
    }

    /// Generation of the availability view the slot list was loaded at.
    pub fn slots_generation(&self) -> Option<u64> {
        self.slots.as_ref().and(self.slots_generation)
    }

    pub fn time_slot(&self) -> Option<&str> {
        self.time_slot.as_deref()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn rescheduling(&self) -> Option<&str> {
        self.rescheduling.as_deref()
    }

    pub fn state(&self) -> IntentState {
        self.state
    }

    pub fn query(&self) -> Option<SlotQuery> {
        self.date.map(|d| SlotQuery::new(self.service_id.clone(), d))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, IntentState::Confirmed | IntentState::Failed)
    }

    fn ensure_editable(&self) -> Result<()> {
        match self.state {
            IntentState::Submitting => Err(BookingError::validation(
                "This booking is being submitted.",
            )),
            IntentState::Confirmed | IntentState::Failed => Err(BookingError::validation(
                "This booking request is finished; start a new one.",
            )),
            _ => Ok(()),
        }
    }

    /// Any date change discards the slot list and the chosen slot.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        self.ensure_editable()?;
        if date < today {
            return Err(BookingError::validation(
                "Please choose today or a later date.",
            ));
        }

        self.date = Some(date);
        self.slots = None;
        self.time_slot = None;
        self.state = IntentState::DateSelected;
        Ok(())
    }

    pub fn begin_loading(&mut self) -> Result<SlotQuery> {
        self.ensure_editable()?;
        let query = self
            .query()
            .ok_or_else(|| BookingError::validation("Please select a date first."))?;
        self.slots = None;
        self.state = IntentState::SlotsLoading;
        Ok(query)
    }

    /// Applies a resolver result. Results for any other (service, date) are ignored.
    pub fn apply_slots(&mut self, resolved: ResolvedSlots) -> bool {
        if self.state != IntentState::SlotsLoading || self.query().as_ref() != Some(&resolved.query)
        {
            tracing::debug!(
                service_id = %resolved.query.service_id,
                date = %resolved.query.date,
                "ignoring availability for a different selection"
            );
            return false;
        }

        let keep = self
            .time_slot
            .as_deref()
            .map(|slot| is_offered(&resolved.slots, slot))
            .unwrap_or(false);
        if !keep {
            self.time_slot = None;
        }

        self.slots = Some(resolved.slots);
        self.slots_generation = Some(resolved.generation);
        self.state = if self.time_slot.is_some() {
            IntentState::SlotSelected
        } else {
            IntentState::SlotsReady
        };
        true
    }

    /// Availability could not be fetched: nothing is selectable until a retry succeeds.
    pub fn slots_failed(&mut self, query: &SlotQuery) {
        if self.state == IntentState::SlotsLoading && self.query().as_ref() == Some(query) {
            self.slots = None;
            self.time_slot = None;
            self.state = IntentState::DateSelected;
        }
    }

    pub fn select_slot(&mut self, slot: &str) -> Result<()> {
        self.ensure_editable()?;
        let slots = match (&self.state, &self.slots) {
            (IntentState::SlotsReady | IntentState::SlotSelected, Some(slots)) => slots,
            _ => {
                return Err(BookingError::validation(
                    "Time slots for this date are not loaded yet.",
                ))
            }
        };
        if !is_offered(slots, slot) {
            return Err(BookingError::validation(format!(
                "The {slot} slot is not available on this date."
            )));
        }

        self.time_slot = Some(slot.to_string());
        self.state = IntentState::SlotSelected;
        Ok(())
    }

    pub fn set_instructions(&mut self, text: &str) {
        let text = text.trim();
        self.instructions = (!text.is_empty()).then(|| text.to_string());
    }

    pub fn begin_submit(&mut self) -> Result<Submission> {
        self.ensure_editable()?;
        let (query, time_slot) = match (self.state, self.query(), &self.time_slot) {
            (IntentState::SlotSelected, Some(query), Some(slot)) => (query, slot.clone()),
            _ => {
                return Err(BookingError::validation(
                    "Please select both date and time slot.",
                ))
            }
        };

        self.state = IntentState::Submitting;
        Ok(Submission {
            query,
            time_slot,
            instructions: self.instructions.clone(),
        })
    }

    pub fn confirm(&mut self) {
        if self.state == IntentState::Submitting {
            self.state = IntentState::Confirmed;
        }
    }

    pub fn fail(&mut self) {
        if self.state == IntentState::Submitting {
            self.state = IntentState::Failed;
        }
    }

    /// A fresh intent carrying over everything the user already chose.
    pub fn retry(&self) -> BookingIntent {
        let state = match (&self.date, &self.slots, &self.time_slot) {
            (Some(_), Some(_), Some(_)) => IntentState::SlotSelected,
            (Some(_), Some(_), None) => IntentState::SlotsReady,
            (Some(_), None, _) => IntentState::DateSelected,
            (None, _, _) => IntentState::Empty,
        };
        BookingIntent {
            time_slot: if self.slots.is_some() {
                self.time_slot.clone()
            } else {
                None
            },
            state,
            ..self.clone()
        }
    }
}
