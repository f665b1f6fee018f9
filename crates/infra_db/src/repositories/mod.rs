//! Repository implementations
//!
//! Each repository owns the SQL and row mapping for one slice of the
//! schema. Queries are runtime-bound so the crate builds without a live
//! database.

pub mod rooms;
pub mod bookings;
pub mod billing;

pub use rooms::RoomRepository;
pub use bookings::BookingRepository;
pub use billing::BillingRepository;
