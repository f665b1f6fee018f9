//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. Tests specify only the relevant fields and take defaults for
//! everything else.

use std::sync::Arc;

use fake::faker::name::en::Name;
use fake::Fake;

use core_kernel::{GuestId, Money, PropertyId, RoomId, StayPeriod};
use domain_booking::{
    AllocationService, Booking, BookingStatus, InMemoryIntervalIndex, InMemoryRoomCatalog,
    RoomRecord,
};
use domain_billing::{BillingAggregator, BillingStore, PaymentReconciler};

use crate::fixtures::{MoneyFixtures, RoomFixtures, StayFixtures};

/// Builder for a standalone Booking aggregate in a target status
///
/// Drives the booking through real transitions, so a built booking is
/// always one the state machine could have produced.
pub struct TestBookingBuilder {
    property_id: PropertyId,
    room_id: Option<RoomId>,
    guest_id: Option<GuestId>,
    guest_name: Option<String>,
    period: StayPeriod,
    nightly_rate: Money,
    status: BookingStatus,
}

impl Default for TestBookingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBookingBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            property_id: PropertyId::new(),
            room_id: Some(RoomId::new()),
            guest_id: Some(GuestId::new()),
            guest_name: Some(Name().fake()),
            period: StayFixtures::standard_stay(),
            nightly_rate: MoneyFixtures::usd_nightly(),
            status: BookingStatus::Pending,
        }
    }

    /// Sets the property
    pub fn with_property(mut self, property_id: PropertyId) -> Self {
        self.property_id = property_id;
        self
    }

    /// Sets or clears the room
    pub fn with_room(mut self, room_id: Option<RoomId>) -> Self {
        self.room_id = room_id;
        self
    }

    /// Sets the guest display name
    pub fn with_guest_name(mut self, name: impl Into<String>) -> Self {
        self.guest_name = Some(name.into());
        self
    }

    /// Sets the stay period
    pub fn with_period(mut self, period: StayPeriod) -> Self {
        self.period = period;
        self
    }

    /// Sets the nightly rate
    pub fn with_rate(mut self, rate: Money) -> Self {
        self.nightly_rate = rate;
        self
    }

    /// Sets the target lifecycle status
    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    /// Builds the booking, driving it to the target status
    pub fn build(self) -> Booking {
        let mut booking = Booking::hold(
            self.property_id,
            self.room_id,
            self.guest_id,
            self.guest_name,
            self.period,
            self.nightly_rate,
        );

        let arrival = self.period.check_in();
        let departure = self.period.check_out();

        match self.status {
            BookingStatus::Pending => {}
            BookingStatus::Confirmed => {
                booking.confirm().expect("builder transition");
            }
            BookingStatus::CheckedIn => {
                booking.confirm().expect("builder transition");
                booking.check_in(arrival).expect("builder transition");
            }
            BookingStatus::CheckedOut => {
                booking.confirm().expect("builder transition");
                booking.check_in(arrival).expect("builder transition");
                booking.check_out(departure, false).expect("builder transition");
            }
            BookingStatus::Cancelled => {
                booking.cancel("test cancellation").expect("builder transition");
            }
            BookingStatus::NoShow => {
                booking.confirm().expect("builder transition");
                booking.mark_no_show().expect("builder transition");
            }
        }
        booking
    }
}

/// A fully wired in-memory engine for integration-style tests
pub struct TestEngine {
    pub allocation: Arc<AllocationService>,
    pub store: Arc<BillingStore>,
    pub aggregator: BillingAggregator,
    pub reconciler: PaymentReconciler,
    pub property_id: PropertyId,
    pub rooms: Vec<RoomId>,
}

/// Builder for a wired engine with a property and rooms
pub struct TestEngineBuilder {
    room_count: usize,
    rooms: Vec<RoomRecord>,
}

impl Default for TestEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngineBuilder {
    pub fn new() -> Self {
        Self {
            room_count: 1,
            rooms: Vec::new(),
        }
    }

    /// Sets how many standard rooms to register
    pub fn with_rooms(mut self, count: usize) -> Self {
        self.room_count = count;
        self
    }

    /// Registers an explicit room record in addition to the standard ones
    pub fn with_room_record(mut self, record: RoomRecord) -> Self {
        self.rooms.push(record);
        self
    }

    /// Builds the wired engine
    pub fn build(self) -> TestEngine {
        let property_id = self
            .rooms
            .first()
            .map(|r| r.property_id)
            .unwrap_or_else(PropertyId::new);

        let catalog = InMemoryRoomCatalog::new();
        let mut rooms = Vec::new();

        for i in 0..self.room_count {
            let record = RoomFixtures::standard_room(property_id, &format!("10{i}"));
            rooms.push(record.id);
            catalog.add_room(record);
        }
        for record in self.rooms {
            rooms.push(record.id);
            catalog.add_room(record);
        }

        let allocation = Arc::new(AllocationService::new(
            Arc::new(InMemoryIntervalIndex::new()),
            Arc::new(catalog),
        ));
        let store = Arc::new(BillingStore::new());

        TestEngine {
            allocation,
            aggregator: BillingAggregator::new(Arc::clone(&store)),
            reconciler: PaymentReconciler::new(Arc::clone(&store)),
            store,
            property_id,
            rooms,
        }
    }
}
