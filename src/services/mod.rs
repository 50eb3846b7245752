pub mod ai;
pub mod assistant;
pub mod availability;
pub mod backend;
pub mod booking_form;
pub mod booking_intent;
pub mod clock;
pub mod conversation;
pub mod coordinator;
pub mod history;
pub mod inbox;
pub mod notify;
pub mod provider;
pub mod reschedule;
pub mod views;
pub mod voice;
