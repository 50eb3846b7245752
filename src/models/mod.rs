pub mod availability;
pub mod booking;
pub mod intent;
pub mod notification;
pub mod service;
pub mod slot;
pub mod user;
pub mod wire;

pub use availability::{
    describe_offered, is_offered, offered_slots, SlotAvailability, SlotQuery, UnavailabilitySet,
    UnavailableSlotsResponse,
};
pub use booking::{
    Ack, Booking, BookingActions, BookingStatus, NewBooking, ProviderStatus, RatingRequest,
    RescheduleRequest, StatusUpdate,
};
pub use intent::{AssistantState, AssistantTurn, ChatIntent};
pub use notification::{unread_count, ResidentNotification};
pub use service::ServiceCatalogEntry;
pub use slot::{SlotCatalog, STANDARD_SLOTS};
pub use user::{LoginRequest, LoginResponse, UserProfile};
