//! Per-room interval index
//!
//! The index answers "is `[check_in, check_out)` free for room R?" and is
//! the foundation for every allocation decision. It is an explicit,
//! injectable abstraction so tests run against an isolated instance and a
//! storage-backed adapter can stand behind the same trait; the database
//! exclusion constraint in `infra_db` remains the backstop once multiple
//! service instances exist.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};

use core_kernel::{BookingId, DomainPort, RoomId, StayPeriod};

use crate::error::BookingError;

/// One blocking interval held by a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalEntry {
    /// The booking occupying the interval
    pub booking_id: BookingId,
    /// The occupied stay, half-open
    pub period: StayPeriod,
}

/// Queryable availability index over per-room blocking intervals
///
/// `reserve` must re-check availability atomically at commit time: the
/// check-and-insert is one critical section per room, never two calls the
/// caller is expected to sequence.
pub trait IntervalIndex: DomainPort {
    /// Returns true iff no blocking interval for the room overlaps the period
    fn is_free(&self, room_id: RoomId, period: &StayPeriod) -> bool;

    /// Inserts a blocking interval, failing on any overlap
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Conflict` when another booking's interval
    /// overlaps, re-checked under the room's lock.
    fn reserve(
        &self,
        room_id: RoomId,
        booking_id: BookingId,
        period: StayPeriod,
    ) -> Result<(), BookingError>;

    /// Removes the booking's interval; returns true if one was present
    ///
    /// Releasing an absent interval is a no-op, which makes repeated
    /// cancellation safe.
    fn release(&self, room_id: RoomId, booking_id: BookingId) -> bool;

    /// Atomically moves the booking's interval to a new period
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Conflict` when the new period overlaps
    /// another booking; the old interval is then still present unchanged.
    fn reschedule(
        &self,
        room_id: RoomId,
        booking_id: BookingId,
        new_period: StayPeriod,
    ) -> Result<(), BookingError>;

    /// Returns the intervals overlapping the period, ordered by check-in
    fn overlapping(&self, room_id: RoomId, period: &StayPeriod) -> CalendarQuery;
}

/// A finite, restartable sequence of overlapping intervals
///
/// Produced from a consistent snapshot of the room's calendar; entries are
/// yielded lazily and the cursor can be rewound for a second pass.
#[derive(Debug, Clone)]
pub struct CalendarQuery {
    entries: Vec<IntervalEntry>,
    cursor: usize,
}

impl CalendarQuery {
    fn new(mut entries: Vec<IntervalEntry>) -> Self {
        entries.sort_by_key(|e| e.period.check_in());
        Self { entries, cursor: 0 }
    }

    /// Rewinds the sequence to the beginning
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Returns the number of entries in the snapshot
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Iterator for CalendarQuery {
    type Item = IntervalEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.get(self.cursor).copied();
        if entry.is_some() {
            self.cursor += 1;
        }
        entry
    }
}

/// In-memory interval index
///
/// Each room's calendar sits behind its own mutex, so the
/// check-then-insert of `reserve` is a single critical section per room
/// and concurrent requests for different rooms do not contend.
#[derive(Debug, Default)]
pub struct InMemoryIntervalIndex {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Vec<IntervalEntry>>>>>,
}

impl DomainPort for InMemoryIntervalIndex {}

impl InMemoryIntervalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn room_calendar(&self, room_id: RoomId) -> Arc<Mutex<Vec<IntervalEntry>>> {
        if let Some(calendar) = self
            .rooms
            .read()
            .expect("interval index lock poisoned")
            .get(&room_id)
        {
            return Arc::clone(calendar);
        }

        let mut rooms = self.rooms.write().expect("interval index lock poisoned");
        Arc::clone(rooms.entry(room_id).or_default())
    }

    fn conflicts(entries: &[IntervalEntry], booking_id: BookingId, period: &StayPeriod) -> bool {
        entries
            .iter()
            .any(|e| e.booking_id != booking_id && e.period.overlaps(period))
    }
}

impl IntervalIndex for InMemoryIntervalIndex {
    fn is_free(&self, room_id: RoomId, period: &StayPeriod) -> bool {
        let calendar = self.room_calendar(room_id);
        let entries = calendar.lock().expect("room calendar lock poisoned");
        !entries.iter().any(|e| e.period.overlaps(period))
    }

    fn reserve(
        &self,
        room_id: RoomId,
        booking_id: BookingId,
        period: StayPeriod,
    ) -> Result<(), BookingError> {
        let calendar = self.room_calendar(room_id);
        let mut entries = calendar.lock().expect("room calendar lock poisoned");

        if Self::conflicts(&entries, booking_id, &period) {
            return Err(BookingError::Conflict { room_id, period });
        }

        // A booking holds at most one interval per room.
        entries.retain(|e| e.booking_id != booking_id);
        entries.push(IntervalEntry { booking_id, period });
        Ok(())
    }

    fn release(&self, room_id: RoomId, booking_id: BookingId) -> bool {
        let calendar = self.room_calendar(room_id);
        let mut entries = calendar.lock().expect("room calendar lock poisoned");

        let before = entries.len();
        entries.retain(|e| e.booking_id != booking_id);
        entries.len() != before
    }

    fn reschedule(
        &self,
        room_id: RoomId,
        booking_id: BookingId,
        new_period: StayPeriod,
    ) -> Result<(), BookingError> {
        let calendar = self.room_calendar(room_id);
        let mut entries = calendar.lock().expect("room calendar lock poisoned");

        // Checked against everyone else before the old interval moves, so
        // a conflict leaves the calendar untouched.
        if Self::conflicts(&entries, booking_id, &new_period) {
            return Err(BookingError::Conflict {
                room_id,
                period: new_period,
            });
        }

        entries.retain(|e| e.booking_id != booking_id);
        entries.push(IntervalEntry {
            booking_id,
            period: new_period,
        });
        Ok(())
    }

    fn overlapping(&self, room_id: RoomId, period: &StayPeriod) -> CalendarQuery {
        let calendar = self.room_calendar(room_id);
        let entries = calendar.lock().expect("room calendar lock poisoned");

        CalendarQuery::new(
            entries
                .iter()
                .filter(|e| e.period.overlaps(period))
                .copied()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn period(from: u32, to: u32) -> StayPeriod {
        StayPeriod::new(
            NaiveDate::from_ymd_opt(2024, 6, from).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, to).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_reserve_then_conflict() {
        let index = InMemoryIntervalIndex::new();
        let room = RoomId::new();

        index.reserve(room, BookingId::new(), period(1, 3)).unwrap();

        assert!(!index.is_free(room, &period(2, 4)));
        let result = index.reserve(room, BookingId::new(), period(2, 4));
        assert!(matches!(result, Err(BookingError::Conflict { .. })));
    }

    #[test]
    fn test_back_to_back_reservations() {
        let index = InMemoryIntervalIndex::new();
        let room = RoomId::new();

        index.reserve(room, BookingId::new(), period(1, 5)).unwrap();
        index.reserve(room, BookingId::new(), period(5, 8)).unwrap();

        assert!(!index.is_free(room, &period(4, 6)));
    }

    #[test]
    fn test_rooms_are_independent() {
        let index = InMemoryIntervalIndex::new();
        let room_a = RoomId::new();
        let room_b = RoomId::new();

        index.reserve(room_a, BookingId::new(), period(1, 3)).unwrap();
        assert!(index.is_free(room_b, &period(1, 3)));
    }

    #[test]
    fn test_release_is_idempotent() {
        let index = InMemoryIntervalIndex::new();
        let room = RoomId::new();
        let booking = BookingId::new();

        index.reserve(room, booking, period(1, 3)).unwrap();
        assert!(index.release(room, booking));
        assert!(!index.release(room, booking));
        assert!(index.is_free(room, &period(1, 3)));
    }

    #[test]
    fn test_reschedule_moves_interval() {
        let index = InMemoryIntervalIndex::new();
        let room = RoomId::new();
        let booking = BookingId::new();

        index.reserve(room, booking, period(1, 3)).unwrap();
        index.reschedule(room, booking, period(10, 12)).unwrap();

        assert!(index.is_free(room, &period(1, 3)));
        assert!(!index.is_free(room, &period(10, 12)));
    }

    #[test]
    fn test_reschedule_conflict_keeps_old_interval() {
        let index = InMemoryIntervalIndex::new();
        let room = RoomId::new();
        let booking = BookingId::new();

        index.reserve(room, booking, period(1, 3)).unwrap();
        index.reserve(room, BookingId::new(), period(10, 12)).unwrap();

        let result = index.reschedule(room, booking, period(11, 13));
        assert!(matches!(result, Err(BookingError::Conflict { .. })));

        // The original interval is still present and blocking.
        assert!(!index.is_free(room, &period(1, 3)));
    }

    #[test]
    fn test_reschedule_may_overlap_itself() {
        let index = InMemoryIntervalIndex::new();
        let room = RoomId::new();
        let booking = BookingId::new();

        // Extending a stay overlaps the booking's own interval.
        index.reserve(room, booking, period(1, 3)).unwrap();
        index.reschedule(room, booking, period(1, 5)).unwrap();

        assert!(!index.is_free(room, &period(4, 5)));
    }

    #[test]
    fn test_overlapping_query_is_sorted_and_restartable() {
        let index = InMemoryIntervalIndex::new();
        let room = RoomId::new();

        index.reserve(room, BookingId::new(), period(10, 12)).unwrap();
        index.reserve(room, BookingId::new(), period(1, 3)).unwrap();
        index.reserve(room, BookingId::new(), period(5, 8)).unwrap();

        let mut query = index.overlapping(room, &period(2, 11));
        let first_pass: Vec<_> = query.by_ref().map(|e| e.period.check_in()).collect();
        assert_eq!(first_pass.len(), 3);
        assert!(first_pass.windows(2).all(|w| w[0] <= w[1]));

        assert!(query.next().is_none());
        query.restart();
        assert_eq!(query.count(), 3);
    }
}
