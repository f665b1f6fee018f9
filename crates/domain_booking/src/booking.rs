//! Booking aggregate
//!
//! The Booking is the unit of allocation: an occupancy claim on a room for
//! a guest over a half-open stay period. Its status is mutated only through
//! the transition methods here; every invalid `(state, event)` pair is
//! rejected with an error naming both states.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{BookingId, GuestId, Money, PropertyId, RoomId, StayPeriod};

use crate::error::BookingError;

/// Booking lifecycle status
///
/// `Confirmed` and `CheckedIn` are the blocking statuses: bookings in
/// those states occupy their room in the interval index. `CheckedOut` and
/// `NoShow` are the billable terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Held, not yet confirmed; does not occupy the room
    Pending,
    /// Confirmed; occupies the room
    Confirmed,
    /// Guest is in house; occupies the room
    CheckedIn,
    /// Stay completed; released and billable
    CheckedOut,
    /// Cancelled before arrival; released, not billable
    Cancelled,
    /// Guest never arrived; released, billable per the caller's policy
    NoShow,
}

impl BookingStatus {
    /// Returns true if a booking in this status occupies its room
    pub fn is_blocking(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::CheckedIn)
    }

    /// Returns true if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::CheckedOut | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Returns true if a booking in this status may be invoiced
    pub fn is_billable(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::NoShow)
    }

    fn name(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An occupancy claim on a room for a guest over a stay period
///
/// # Invariants
///
/// - `period` is always a valid half-open range (`check_in < check_out`)
/// - Status changes only through the transition methods
/// - A booking with no room never occupies the interval index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: BookingId,
    /// Property the stay belongs to
    pub property_id: PropertyId,
    /// Allocated room; None for an unassigned hold
    pub room_id: Option<RoomId>,
    /// Guest directory reference, if the guest is registered
    pub guest_id: Option<GuestId>,
    /// Denormalized display name; legacy bookings may carry only this
    pub guest_name: Option<String>,
    /// The booked stay, half-open `[check_in, check_out)`
    pub period: StayPeriod,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Nightly rate handed in by the room catalog at allocation time
    pub nightly_rate: Money,
    /// When the guest actually arrived
    pub checked_in_at: Option<DateTime<Utc>>,
    /// When the guest actually departed
    pub checked_out_at: Option<DateTime<Utc>>,
    /// Reason recorded on cancellation
    pub cancellation_reason: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new pending booking
    pub fn hold(
        property_id: PropertyId,
        room_id: Option<RoomId>,
        guest_id: Option<GuestId>,
        guest_name: Option<String>,
        period: StayPeriod,
        nightly_rate: Money,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: BookingId::new_v7(),
            property_id,
            room_id,
            guest_id,
            guest_name,
            period,
            status: BookingStatus::Pending,
            nightly_rate,
            checked_in_at: None,
            checked_out_at: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the number of billable nights
    pub fn nights(&self) -> i64 {
        self.period.nights()
    }

    /// Returns the room-night charge for the full stay
    pub fn stay_charge(&self) -> Money {
        self.nightly_rate.times(self.nights())
    }

    /// Confirms a pending booking
    ///
    /// The availability re-check and interval reservation are the
    /// allocation service's duty; this only enforces the state table.
    pub fn confirm(&mut self) -> Result<(), BookingError> {
        self.transition_to(BookingStatus::Confirmed)
    }

    /// Checks the guest in
    ///
    /// # Errors
    ///
    /// Fails unless the booking is confirmed and `on` falls within the
    /// stay window.
    pub fn check_in(&mut self, on: NaiveDate) -> Result<(), BookingError> {
        self.ensure_can_transition_to(BookingStatus::CheckedIn)?;
        if !self.period.contains(on) {
            return Err(BookingError::CheckInOutsideStay {
                date: on,
                period: self.period,
            });
        }
        self.status = BookingStatus::CheckedIn;
        self.checked_in_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Checks the guest out
    ///
    /// # Errors
    ///
    /// Fails unless the booking is checked in and either the departure
    /// date has been reached or `early` is set.
    pub fn check_out(&mut self, on: NaiveDate, early: bool) -> Result<(), BookingError> {
        self.ensure_can_transition_to(BookingStatus::CheckedOut)?;
        if on < self.period.check_out() && !early {
            return Err(BookingError::CheckOutBeforeDeparture {
                date: on,
                period: self.period,
            });
        }
        self.status = BookingStatus::CheckedOut;
        self.checked_out_at = Some(Utc::now());
        self.touch();
        Ok(())
    }

    /// Cancels the booking, recording the reason
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), BookingError> {
        self.ensure_can_transition_to(BookingStatus::Cancelled)?;
        self.status = BookingStatus::Cancelled;
        self.cancellation_reason = Some(reason.into());
        self.touch();
        Ok(())
    }

    /// Marks a confirmed booking as a no-show
    pub fn mark_no_show(&mut self) -> Result<(), BookingError> {
        self.transition_to(BookingStatus::NoShow)
    }

    /// Moves the stay to a new period
    ///
    /// The interval swap is the allocation service's duty; a booking past
    /// check-in cannot be moved.
    pub fn reschedule(&mut self, new_period: StayPeriod) -> Result<(), BookingError> {
        if !matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed) {
            return Err(BookingError::NotReschedulable { status: self.status });
        }
        self.period = new_period;
        self.touch();
        Ok(())
    }

    /// Returns true if the state table allows the transition
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self.status, target),
            (Pending, Confirmed)
                | (Confirmed, CheckedIn)
                | (CheckedIn, CheckedOut)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        )
    }

    fn ensure_can_transition_to(&self, target: BookingStatus) -> Result<(), BookingError> {
        if !self.can_transition_to(target) {
            return Err(BookingError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    fn transition_to(&mut self, target: BookingStatus) -> Result<(), BookingError> {
        self.ensure_can_transition_to(target)?;
        self.status = target;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_booking() -> Booking {
        Booking::hold(
            PropertyId::new(),
            Some(RoomId::new()),
            Some(GuestId::new()),
            Some("Ada Lovelace".to_string()),
            StayPeriod::new(date(2024, 6, 1), date(2024, 6, 3)).unwrap(),
            Money::new(dec!(100.00), Currency::USD),
        )
    }

    #[test]
    fn test_new_booking_is_pending_and_non_blocking() {
        let booking = test_booking();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(!booking.status.is_blocking());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut booking = test_booking();

        booking.confirm().unwrap();
        assert!(booking.status.is_blocking());

        booking.check_in(date(2024, 6, 1)).unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedIn);

        booking.check_out(date(2024, 6, 3), false).unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedOut);
        assert!(booking.status.is_billable());
        assert!(booking.checked_out_at.is_some());
    }

    #[test]
    fn test_check_in_outside_stay_window() {
        let mut booking = test_booking();
        booking.confirm().unwrap();

        let result = booking.check_in(date(2024, 5, 30));
        assert!(matches!(result, Err(BookingError::CheckInOutsideStay { .. })));

        // The check-out date itself is outside the half-open window.
        let result = booking.check_in(date(2024, 6, 3));
        assert!(matches!(result, Err(BookingError::CheckInOutsideStay { .. })));
    }

    #[test]
    fn test_early_check_out_requires_flag() {
        let mut booking = test_booking();
        booking.confirm().unwrap();
        booking.check_in(date(2024, 6, 1)).unwrap();

        let result = booking.check_out(date(2024, 6, 2), false);
        assert!(matches!(
            result,
            Err(BookingError::CheckOutBeforeDeparture { .. })
        ));

        booking.check_out(date(2024, 6, 2), true).unwrap();
        assert_eq!(booking.status, BookingStatus::CheckedOut);
    }

    #[test]
    fn test_cancel_from_pending_and_confirmed() {
        let mut pending = test_booking();
        pending.cancel("guest request").unwrap();
        assert_eq!(pending.status, BookingStatus::Cancelled);
        assert_eq!(pending.cancellation_reason.as_deref(), Some("guest request"));

        let mut confirmed = test_booking();
        confirmed.confirm().unwrap();
        confirmed.cancel("weather").unwrap();
        assert_eq!(confirmed.status, BookingStatus::Cancelled);
    }

    #[test]
    fn test_no_show_only_from_confirmed() {
        let mut pending = test_booking();
        assert!(matches!(
            pending.mark_no_show(),
            Err(BookingError::InvalidTransition { .. })
        ));

        pending.confirm().unwrap();
        pending.mark_no_show().unwrap();
        assert_eq!(pending.status, BookingStatus::NoShow);
        assert!(pending.status.is_billable());
    }

    #[test]
    fn test_invalid_transitions_name_both_states() {
        let mut booking = test_booking();
        booking.confirm().unwrap();
        booking.check_in(date(2024, 6, 1)).unwrap();

        let err = booking.cancel("too late").unwrap_err();
        match err {
            BookingError::InvalidTransition { from, to } => {
                assert_eq!(from, BookingStatus::CheckedIn);
                assert_eq!(to, BookingStatus::Cancelled);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let mut booking = test_booking();
        booking.cancel("dup").unwrap();

        assert!(booking.confirm().is_err());
        assert!(booking.check_in(date(2024, 6, 1)).is_err());
        assert!(booking.check_out(date(2024, 6, 3), false).is_err());
        assert!(booking.mark_no_show().is_err());
    }

    #[test]
    fn test_reschedule_blocked_after_check_in() {
        let mut booking = test_booking();
        booking.confirm().unwrap();
        booking.check_in(date(2024, 6, 1)).unwrap();

        let new_period = StayPeriod::new(date(2024, 6, 10), date(2024, 6, 12)).unwrap();
        assert!(matches!(
            booking.reschedule(new_period),
            Err(BookingError::NotReschedulable { .. })
        ));
    }

    #[test]
    fn test_stay_charge() {
        let booking = test_booking();
        assert_eq!(booking.stay_charge().amount(), dec!(200.00));
    }
}
