use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::availability::{SlotAvailability, UnavailabilitySet};

/// The slot vocabulary shared by every service and every call site.
pub const STANDARD_SLOTS: [&str; 5] = [
    "08:00-10:00",
    "10:00-12:00",
    "12:00-14:00",
    "14:00-16:00",
    "16:00-18:00",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCatalog {
    slots: Vec<String>,
}

impl SlotCatalog {
    pub fn standard() -> Self {
        Self {
            slots: STANDARD_SLOTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn new(slots: Vec<String>) -> anyhow::Result<Self> {
        for (i, slot) in slots.iter().enumerate() {
            let (start, end) = parse_slot(slot)?;
            if start >= end {
                anyhow::bail!("slot ends before it starts: {slot}");
            }
            if slots[..i].contains(slot) {
                anyhow::bail!("duplicate slot: {slot}");
            }
        }
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s == slot)
    }

    /// Catalog order is the only order availability is ever reported in.
    pub fn resolve(&self, unavailable: &UnavailabilitySet) -> Vec<SlotAvailability> {
        self.slots
            .iter()
            .map(|slot| SlotAvailability {
                slot: slot.clone(),
                available: !unavailable.contains(slot),
            })
            .collect()
    }

    /// Matches loose user input ("10:00", "10:00 - 12:00", "10:00-12:00") to a catalog slot.
    pub fn match_slot(&self, input: &str) -> Option<&str> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if let Some(slot) = self.slots.iter().find(|s| **s == compact) {
            return Some(slot.as_str());
        }

        let wanted = parse_time(&compact).ok()?;
        self.slots
            .iter()
            .find(|s| parse_slot(s).map(|(start, _)| start == wanted).unwrap_or(false))
            .map(|s| s.as_str())
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn parse_slot(s: &str) -> anyhow::Result<(NaiveTime, NaiveTime)> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("invalid slot format: {s}"))?;
    Ok((parse_time(start.trim())?, parse_time(end.trim())?))
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let (hour, minute) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    let hour: u32 = hour
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}
