//! Booking Domain - Room Allocation and Stay Lifecycle
//!
//! This crate implements the reservation side of the lodging core: the
//! booking state machine, the per-room interval index that prevents
//! double-booking, and the allocation service that ties them together.
//!
//! # Booking Lifecycle
//!
//! ```text
//! Pending -> Confirmed -> CheckedIn -> CheckedOut
//!    |           |
//!    +-----------+--> Cancelled      Confirmed --> NoShow
//! ```
//!
//! Only `Confirmed` and `CheckedIn` bookings occupy a room in the interval
//! index. Intervals are half-open `[check_in, check_out)`, so a checkout
//! and a check-in on the same day never collide.

pub mod booking;
pub mod interval;
pub mod allocation;
pub mod error;

pub use booking::{Booking, BookingStatus};
pub use interval::{IntervalIndex, IntervalEntry, InMemoryIntervalIndex, CalendarQuery};
pub use allocation::{AllocationService, RoomCatalog, RoomRecord, RoomStatus, InMemoryRoomCatalog};
pub use error::BookingError;
