//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the lodging
//! system. These fixtures are designed to be consistent and predictable
//! for unit tests.

use chrono::NaiveDate;
use core_kernel::{Currency, Money, PropertyId, RoomId, StayPeriod};
use domain_booking::{RoomRecord, RoomStatus};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The standard nightly rate used across scenario tests
    pub fn usd_nightly() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// A standard USD amount
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// A two-night stay at the standard rate
    pub fn usd_200() -> Money {
        Money::new(dec!(200.00), Currency::USD)
    }

    /// A zero amount
    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// A EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for stay-period test data
pub struct StayFixtures;

impl StayFixtures {
    /// A date in the standard test month (June 2024)
    pub fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).expect("valid June date")
    }

    /// The standard two-night stay, June 1-3
    pub fn standard_stay() -> StayPeriod {
        StayPeriod::new(Self::june(1), Self::june(3)).expect("valid fixture period")
    }

    /// A stay overlapping the standard one, June 2-4
    pub fn overlapping_stay() -> StayPeriod {
        StayPeriod::new(Self::june(2), Self::june(4)).expect("valid fixture period")
    }

    /// A stay starting the day the standard one ends, June 3-6
    pub fn back_to_back_stay() -> StayPeriod {
        StayPeriod::new(Self::june(3), Self::june(6)).expect("valid fixture period")
    }

    /// A stay disjoint from everything above, June 20-25
    pub fn disjoint_stay() -> StayPeriod {
        StayPeriod::new(Self::june(20), Self::june(25)).expect("valid fixture period")
    }
}

/// Fixture for room catalog test data
pub struct RoomFixtures;

impl RoomFixtures {
    /// A standard available room at the standard rate
    pub fn standard_room(property_id: PropertyId, number: &str) -> RoomRecord {
        RoomRecord {
            id: RoomId::new(),
            property_id,
            number: number.to_string(),
            nightly_rate: MoneyFixtures::usd_nightly(),
            status: RoomStatus::Available,
        }
    }

    /// A room taken out of service
    pub fn out_of_service_room(property_id: PropertyId, number: &str) -> RoomRecord {
        RoomRecord {
            status: RoomStatus::OutOfService,
            ..Self::standard_room(property_id, number)
        }
    }
}
