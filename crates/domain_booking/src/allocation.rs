//! Allocation service
//!
//! Orchestrates the booking state machine and the interval index under a
//! concurrency-safe protocol: the availability check and the interval
//! insert are one atomic unit per room, and every booking is mutated under
//! its own lock so a booking is never raced against itself.
//!
//! The service never retries a lost reservation race on the caller's
//! behalf; a `Conflict` is returned for the caller to retry once after a
//! fresh availability check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{BookingId, DomainPort, GuestId, Money, PropertyId, RoomId, StayPeriod, Timezone};

use crate::booking::{Booking, BookingStatus};
use crate::error::BookingError;
use crate::interval::{CalendarQuery, IntervalIndex};

/// Operational status of a room
///
/// Rooms are soft-disabled through this status and never deleted while
/// bookings reference them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    OutOfService,
}

/// A room as seen through the catalog seam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    pub property_id: PropertyId,
    /// Room number, unique within the property
    pub number: String,
    pub nightly_rate: Money,
    pub status: RoomStatus,
}

/// Read-only seam to the external property/room catalog
///
/// The catalog admin owns room CRUD; the core only reads existence,
/// property membership, nightly rate, operational status, and the
/// property timezone used to derive the local business date.
pub trait RoomCatalog: DomainPort {
    fn room(&self, room_id: RoomId) -> Result<RoomRecord, BookingError>;

    fn property_timezone(&self, _property_id: PropertyId) -> Timezone {
        Timezone::default()
    }
}

/// In-memory room catalog for tests and single-process deployments
#[derive(Debug, Default)]
pub struct InMemoryRoomCatalog {
    rooms: RwLock<HashMap<RoomId, RoomRecord>>,
    timezones: RwLock<HashMap<PropertyId, Timezone>>,
}

impl DomainPort for InMemoryRoomCatalog {}

impl InMemoryRoomCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a room, replacing any previous record under the same id
    pub fn add_room(&self, record: RoomRecord) {
        self.rooms
            .write()
            .expect("room catalog lock poisoned")
            .insert(record.id, record);
    }

    /// Sets the timezone used for a property's business date
    pub fn set_timezone(&self, property_id: PropertyId, timezone: Timezone) {
        self.timezones
            .write()
            .expect("room catalog lock poisoned")
            .insert(property_id, timezone);
    }

    /// Updates a room's operational status
    pub fn set_room_status(&self, room_id: RoomId, status: RoomStatus) -> Result<(), BookingError> {
        let mut rooms = self.rooms.write().expect("room catalog lock poisoned");
        let record = rooms
            .get_mut(&room_id)
            .ok_or_else(|| BookingError::RoomNotFound(room_id.to_string()))?;
        record.status = status;
        Ok(())
    }
}

impl RoomCatalog for InMemoryRoomCatalog {
    fn room(&self, room_id: RoomId) -> Result<RoomRecord, BookingError> {
        self.rooms
            .read()
            .expect("room catalog lock poisoned")
            .get(&room_id)
            .cloned()
            .ok_or_else(|| BookingError::RoomNotFound(room_id.to_string()))
    }

    fn property_timezone(&self, property_id: PropertyId) -> Timezone {
        self.timezones
            .read()
            .expect("room catalog lock poisoned")
            .get(&property_id)
            .copied()
            .unwrap_or_default()
    }
}

/// Creates and mutates bookings without ever double-allocating a room
pub struct AllocationService {
    index: Arc<dyn IntervalIndex>,
    catalog: Arc<dyn RoomCatalog>,
    bookings: RwLock<HashMap<BookingId, Arc<Mutex<Booking>>>>,
}

impl AllocationService {
    pub fn new(index: Arc<dyn IntervalIndex>, catalog: Arc<dyn RoomCatalog>) -> Self {
        Self {
            index,
            catalog,
            bookings: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a pending booking for a room
    ///
    /// Validates the range before any index access, then verifies the room
    /// through the catalog. A pending booking does not block the index;
    /// the slot is only checked here so an obviously taken room is
    /// rejected up front.
    ///
    /// # Errors
    ///
    /// - `InvalidRange` for a zero-length or inverted range
    /// - `RoomNotFound` / `RoomNotInProperty` / `RoomOutOfService`
    /// - `Conflict` when the interval is already blocked
    pub fn create_booking(
        &self,
        property_id: PropertyId,
        room_id: RoomId,
        guest_id: Option<GuestId>,
        guest_name: Option<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let period = StayPeriod::new(check_in, check_out)?;
        let room = self.lookup_room(property_id, room_id)?;

        if !self.index.is_free(room_id, &period) {
            warn!(%room_id, %period, "booking rejected: interval already blocked");
            return Err(BookingError::Conflict { room_id, period });
        }

        let booking = Booking::hold(
            property_id,
            Some(room_id),
            guest_id,
            guest_name,
            period,
            room.nightly_rate,
        );
        self.insert(booking.clone());

        info!(booking_id = %booking.id, %room_id, %period, "booking created");
        Ok(booking)
    }

    /// Creates a pending booking with no room assigned
    ///
    /// An unassigned hold never enters the interval index; the nightly
    /// rate is handed in by the caller since there is no room to price it.
    pub fn create_unassigned_booking(
        &self,
        property_id: PropertyId,
        guest_id: Option<GuestId>,
        guest_name: Option<String>,
        nightly_rate: Money,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let period = StayPeriod::new(check_in, check_out)?;

        let booking = Booking::hold(property_id, None, guest_id, guest_name, period, nightly_rate);
        self.insert(booking.clone());

        info!(booking_id = %booking.id, %period, "unassigned booking created");
        Ok(booking)
    }

    /// Confirms a pending booking - the canonical double-booking guard
    ///
    /// Availability is re-validated atomically: another booking may have
    /// been confirmed for the same slot while this one was pending. On a
    /// lost race the booking stays pending and `Conflict` is returned.
    pub fn confirm_booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        let entry = self.entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        if booking.status != BookingStatus::Pending {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Confirmed,
            });
        }

        if let Some(room_id) = booking.room_id {
            // Atomic check-and-reserve under the room's lock.
            self.index.reserve(room_id, booking.id, booking.period)?;
        }

        booking.confirm()?;
        info!(%booking_id, "booking confirmed");
        Ok(booking.clone())
    }

    /// Attaches a room to an unassigned booking
    ///
    /// A booking already in a blocking state reserves the interval before
    /// the room is recorded, so the non-overlap invariant holds the moment
    /// the assignment becomes visible.
    pub fn assign_room(
        &self,
        booking_id: BookingId,
        room_id: RoomId,
    ) -> Result<Booking, BookingError> {
        let entry = self.entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        if booking.room_id.is_some() {
            return Err(BookingError::RoomAlreadyAssigned(booking_id));
        }
        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(BookingError::RoomNotAssignable {
                status: booking.status,
            });
        }

        let room = self.lookup_room(booking.property_id, room_id)?;

        if booking.status.is_blocking() {
            self.index.reserve(room_id, booking.id, booking.period)?;
        } else if !self.index.is_free(room_id, &booking.period) {
            return Err(BookingError::Conflict {
                room_id,
                period: booking.period,
            });
        }

        booking.room_id = Some(room_id);
        booking.nightly_rate = room.nightly_rate;

        info!(%booking_id, %room_id, "room assigned");
        Ok(booking.clone())
    }

    /// Moves a booking to a new stay period as a single operation
    ///
    /// For a blocking booking the old interval is released and the new one
    /// reserved atomically; on conflict the old interval is restored
    /// unchanged and the booking keeps its original dates.
    pub fn reschedule_booking(
        &self,
        booking_id: BookingId,
        new_check_in: NaiveDate,
        new_check_out: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let new_period = StayPeriod::new(new_check_in, new_check_out)?;

        let entry = self.entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(BookingError::NotReschedulable {
                status: booking.status,
            });
        }

        if booking.status.is_blocking() {
            if let Some(room_id) = booking.room_id {
                self.index.reschedule(room_id, booking.id, new_period)?;
            }
        }

        booking.reschedule(new_period)?;
        info!(%booking_id, %new_period, "booking rescheduled");
        Ok(booking.clone())
    }

    /// Cancels a booking, releasing its interval if it was blocking
    ///
    /// Idempotent: cancelling an already-cancelled booking returns the
    /// same terminal state without touching the index again.
    pub fn cancel_booking(
        &self,
        booking_id: BookingId,
        reason: impl Into<String>,
    ) -> Result<Booking, BookingError> {
        let entry = self.entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        if booking.status == BookingStatus::Cancelled {
            return Ok(booking.clone());
        }

        let was_blocking = booking.status.is_blocking();
        booking.cancel(reason)?;

        if was_blocking {
            if let Some(room_id) = booking.room_id {
                self.index.release(room_id, booking.id);
            }
        }

        info!(%booking_id, "booking cancelled");
        Ok(booking.clone())
    }

    /// Checks the guest in using the property's current business date
    pub fn check_in(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        let today = self.business_date(booking_id)?;
        self.check_in_on(booking_id, today)
    }

    /// Checks the guest in on an explicit date
    pub fn check_in_on(
        &self,
        booking_id: BookingId,
        on: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let entry = self.entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        booking.check_in(on)?;
        info!(%booking_id, date = %on, "guest checked in");
        Ok(booking.clone())
    }

    /// Checks the guest out using the property's current business date
    pub fn check_out(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        let today = self.business_date(booking_id)?;
        self.check_out_on(booking_id, today, false)
    }

    /// Checks the guest out on an explicit date
    ///
    /// Releases the interval and returns the billable snapshot for the
    /// billing aggregator. Departing before the booked check-out date
    /// requires the `early` flag.
    pub fn check_out_on(
        &self,
        booking_id: BookingId,
        on: NaiveDate,
        early: bool,
    ) -> Result<Booking, BookingError> {
        let entry = self.entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        booking.check_out(on, early)?;

        if let Some(room_id) = booking.room_id {
            self.index.release(room_id, booking.id);
        }

        info!(%booking_id, date = %on, early, "guest checked out");
        Ok(booking.clone())
    }

    /// Marks a confirmed booking as a no-show
    ///
    /// Releases the interval; whether and how much the no-show is billed
    /// is the caller's policy, expressed in the line items it hands to the
    /// billing aggregator.
    pub fn mark_no_show(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        let entry = self.entry(booking_id)?;
        let mut booking = entry.lock().expect("booking lock poisoned");

        booking.mark_no_show()?;

        if let Some(room_id) = booking.room_id {
            self.index.release(room_id, booking.id);
        }

        info!(%booking_id, "booking marked no-show");
        Ok(booking.clone())
    }

    /// Returns a snapshot of the booking
    pub fn booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        let entry = self.entry(booking_id)?;
        let booking = entry.lock().expect("booking lock poisoned");
        Ok(booking.clone())
    }

    /// Runs `f` while holding the booking's transition lock
    ///
    /// Invoice materialization reads booking state through this, so a
    /// booking cannot be cancelled out from under an in-flight invoice.
    pub fn with_booking<R>(
        &self,
        booking_id: BookingId,
        f: impl FnOnce(&Booking) -> R,
    ) -> Result<R, BookingError> {
        let entry = self.entry(booking_id)?;
        let booking = entry.lock().expect("booking lock poisoned");
        Ok(f(&booking))
    }

    /// Returns the blocked intervals overlapping a date range for a room
    pub fn calendar(
        &self,
        room_id: RoomId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<CalendarQuery, BookingError> {
        let period = StayPeriod::new(from, to)?;
        Ok(self.index.overlapping(room_id, &period))
    }

    fn lookup_room(
        &self,
        property_id: PropertyId,
        room_id: RoomId,
    ) -> Result<RoomRecord, BookingError> {
        let room = self.catalog.room(room_id)?;
        if room.property_id != property_id {
            return Err(BookingError::RoomNotInProperty {
                room_id,
                property_id,
            });
        }
        if room.status != RoomStatus::Available {
            return Err(BookingError::RoomOutOfService(room_id));
        }
        Ok(room)
    }

    fn business_date(&self, booking_id: BookingId) -> Result<NaiveDate, BookingError> {
        let property_id = self.with_booking(booking_id, |b| b.property_id)?;
        Ok(self.catalog.property_timezone(property_id).today())
    }

    fn entry(&self, booking_id: BookingId) -> Result<Arc<Mutex<Booking>>, BookingError> {
        self.bookings
            .read()
            .expect("booking arena lock poisoned")
            .get(&booking_id)
            .map(Arc::clone)
            .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))
    }

    fn insert(&self, booking: Booking) {
        self.bookings
            .write()
            .expect("booking arena lock poisoned")
            .insert(booking.id, Arc::new(Mutex::new(booking)));
    }
}
