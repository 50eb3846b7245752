use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::{SlotAvailability, SlotCatalog, SlotQuery};
use crate::services::backend::BookingBackend;
use crate::session::Credential;

/// Availability for one (service, date) pair, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlots {
    pub query: SlotQuery,
    pub slots: Vec<SlotAvailability>,
    /// View generation observed before the fetch started.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Current(ResolvedSlots),
    /// A newer request was issued while this one was in flight; its answer was dropped.
    Superseded,
}

impl Resolution {
    pub(crate) fn at_generation(self, generation: u64) -> Self {
        match self {
            Resolution::Current(resolved) => Resolution::Current(ResolvedSlots {
                generation,
                ..resolved
            }),
            Resolution::Superseded => Resolution::Superseded,
        }
    }
}

/// Computes offered slots for one view. Each instance keeps its own request token so
/// only the answer for the most recent selection is ever applied.
pub struct AvailabilityResolver {
    backend: Arc<dyn BookingBackend>,
    catalog: SlotCatalog,
    latest: AtomicU64,
}

impl AvailabilityResolver {
    pub fn new(backend: Arc<dyn BookingBackend>, catalog: SlotCatalog) -> Self {
        Self {
            backend,
            catalog,
            latest: AtomicU64::new(0),
        }
    }

    pub fn catalog(&self) -> &SlotCatalog {
        &self.catalog
    }

    /// Drops whatever is in flight without issuing a new request.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn resolve(&self, cred: &Credential, query: SlotQuery) -> Result<Resolution> {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            service_id = %query.service_id,
            date = %query.date,
            token,
            "fetching unavailable slots"
        );

        let fetched = self.backend.unavailable_slots(cred, &query).await;

        if self.latest.load(Ordering::SeqCst) != token {
            tracing::debug!(
                service_id = %query.service_id,
                date = %query.date,
                token,
                "discarding superseded availability response"
            );
            return Ok(Resolution::Superseded);
        }

        let unavailable = fetched?;
        for slot in unavailable.iter().filter(|s| !self.catalog.contains(s)) {
            tracing::debug!(slot, "backend reported a slot outside the catalog");
        }

        Ok(Resolution::Current(ResolvedSlots {
            slots: self.catalog.resolve(&unavailable),
            query,
            generation: 0,
        }))
    }
}
