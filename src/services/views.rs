use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::SlotQuery;

/// A client-side view whose contents came from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Availability(SlotQuery),
    BookingList,
    Booking(String),
    /// A provider's assigned bookings.
    AssignedBookings,
    Notifications,
}

#[derive(Default)]
struct Tracked {
    stale: HashSet<ViewKey>,
    generations: HashMap<ViewKey, u64>,
}

/// Tracks which views must be re-fetched before they can be trusted again.
///
/// Every mutation bumps the view's generation. A call site that loaded a view at
/// generation `g` must re-fetch once `generation(key) != g`, even if some other
/// call site has refreshed the view in between.
#[derive(Default)]
pub struct StaleViews {
    tracked: Mutex<Tracked>,
}

impl StaleViews {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mark_stale(&self, key: ViewKey) {
        let mut tracked = self.lock();
        let generation = tracked.generations.entry(key.clone()).or_insert(0);
        *generation += 1;
        tracing::debug!(view = ?key, generation = *generation, "view marked stale");
        tracked.stale.insert(key);
    }

    pub fn mark_fresh(&self, key: &ViewKey) {
        self.lock().stale.remove(key);
    }

    pub fn is_stale(&self, key: &ViewKey) -> bool {
        self.lock().stale.contains(key)
    }

    pub fn generation(&self, key: &ViewKey) -> u64 {
        self.lock().generations.get(key).copied().unwrap_or(0)
    }
}
