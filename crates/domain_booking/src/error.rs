//! Booking domain errors

use chrono::NaiveDate;
use thiserror::Error;

use core_kernel::{BookingId, PropertyId, RoomId, StayPeriod, TemporalError};

use crate::booking::BookingStatus;

/// Errors that can occur in the booking domain
#[derive(Debug, Error)]
pub enum BookingError {
    /// Malformed or inverted date range, rejected before any side effect
    #[error("Invalid stay range: check-in {check_in} must be before check-out {check_out}")]
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    /// Room unavailable for the requested interval; the caller may pick
    /// another room or date and retry once after a fresh availability check
    #[error("Room {room_id} is no longer available for {period}")]
    Conflict {
        room_id: RoomId,
        period: StayPeriod,
    },

    /// State machine rule violation, surfaced not retried
    #[error("Booking cannot transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Reschedule requested for a booking past the point of rescheduling
    #[error("Booking cannot be rescheduled from {status}")]
    NotReschedulable { status: BookingStatus },

    /// Check-in attempted outside the booked stay window
    #[error("Check-in on {date} is outside the stay {period}")]
    CheckInOutsideStay {
        date: NaiveDate,
        period: StayPeriod,
    },

    /// Check-out attempted before the departure date without the early flag
    #[error("Check-out on {date} is before the departure date of {period}; use early checkout")]
    CheckOutBeforeDeparture {
        date: NaiveDate,
        period: StayPeriod,
    },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room {room_id} does not belong to property {property_id}")]
    RoomNotInProperty {
        room_id: RoomId,
        property_id: PropertyId,
    },

    #[error("Room {0} is out of service")]
    RoomOutOfService(RoomId),

    #[error("Booking {0} already has a room assigned")]
    RoomAlreadyAssigned(BookingId),

    /// Room assignment attempted on a booking past the point of assignment
    #[error("Room cannot be assigned to a booking in {status}")]
    RoomNotAssignable { status: BookingStatus },
}

impl From<TemporalError> for BookingError {
    fn from(err: TemporalError) -> Self {
        match err {
            TemporalError::InvalidRange { check_in, check_out } => {
                BookingError::InvalidRange { check_in, check_out }
            }
        }
    }
}
