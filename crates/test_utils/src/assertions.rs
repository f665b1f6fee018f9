//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_booking::Booking;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more
/// than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts the non-overlap invariant over a set of bookings
///
/// For every pair of distinct bookings in a blocking state that reference
/// the same room, the stay periods must be disjoint.
///
/// # Panics
///
/// Panics naming the offending pair when two blocking bookings overlap
pub fn assert_no_room_overlap(bookings: &[Booking]) {
    for (i, a) in bookings.iter().enumerate() {
        for b in bookings.iter().skip(i + 1) {
            let same_room = match (a.room_id, b.room_id) {
                (Some(ra), Some(rb)) => ra == rb,
                _ => false,
            };
            if same_room && a.status.is_blocking() && b.status.is_blocking() {
                assert!(
                    !a.period.overlaps(&b.period),
                    "Bookings {} ({}) and {} ({}) overlap on room {:?}",
                    a.id,
                    a.period,
                    b.id,
                    b.period,
                    a.room_id
                );
            }
        }
    }
}
