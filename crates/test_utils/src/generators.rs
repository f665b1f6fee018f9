//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data that
//! maintains domain invariants.

use chrono::NaiveDate;
use core_kernel::{Currency, Money, StayPeriod};
use proptest::prelude::*;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::CHF),
        Just(Currency::AUD),
        Just(Currency::CAD),
        Just(Currency::SGD),
    ]
}

/// Strategy for generating positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating positive USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for generating positive Money values in any currency
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating valid stay periods within 2024
///
/// Stays start on an arbitrary day of the year and run 1-30 nights.
pub fn stay_period_strategy() -> impl Strategy<Value = StayPeriod> {
    (0i64..330, 1i64..30).prop_map(|(offset, nights)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid base date");
        let check_in = base + chrono::Duration::days(offset);
        let check_out = check_in + chrono::Duration::days(nights);
        StayPeriod::new(check_in, check_out).expect("generated period is valid")
    })
}

/// Strategy for a pair of stay periods that are guaranteed to overlap
pub fn overlapping_periods_strategy() -> impl Strategy<Value = (StayPeriod, StayPeriod)> {
    (0i64..300, 2i64..20, 1i64..19).prop_map(|(offset, nights, shift)| {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid base date");
        let a_in = base + chrono::Duration::days(offset);
        let a_out = a_in + chrono::Duration::days(nights);
        // Shift strictly inside the first stay so one night is shared.
        let b_in = a_in + chrono::Duration::days(shift.min(nights - 1));
        let b_out = b_in + chrono::Duration::days(nights);
        (
            StayPeriod::new(a_in, a_out).expect("generated period is valid"),
            StayPeriod::new(b_in, b_out).expect("generated period is valid"),
        )
    })
}
