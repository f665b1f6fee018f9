//! Comprehensive unit tests for the Money module

use core_kernel::{Money, Currency, MoneyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod construction {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_places() {
        let m = Money::new(dec!(99.99999), Currency::USD);
        assert_eq!(m.amount(), dec!(100.0000));
    }

    #[test]
    fn test_from_minor_units() {
        assert_eq!(Money::from_minor(12345, Currency::USD).amount(), dec!(123.45));
        // JPY has no minor unit.
        assert_eq!(Money::from_minor(12345, Currency::JPY).amount(), dec!(12345));
    }

    #[test]
    fn test_zero() {
        let z = Money::zero(Currency::EUR);
        assert!(z.is_zero());
        assert!(!z.is_positive());
        assert!(!z.is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(dec!(120.00), Currency::USD);
        let b = Money::new(dec!(180.00), Currency::USD);

        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(300.00));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let usd = Money::new(dec!(1), Currency::USD);
        let gbp = Money::new(dec!(1), Currency::GBP);

        assert!(matches!(
            usd.checked_add(&gbp),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_checked_sub_can_go_negative() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(150.00), Currency::USD);

        let result = a.checked_sub(&b).unwrap();
        assert!(result.is_negative());
        assert_eq!(result.amount(), dec!(-50.00));
    }

    #[test]
    fn test_neg_and_abs() {
        let m = Money::new(dec!(75.00), Currency::USD);
        assert_eq!((-m).amount(), dec!(-75.00));
        assert_eq!((-m).abs(), m);
    }

    #[test]
    fn test_times_for_night_counts() {
        let nightly = Money::new(dec!(100.00), Currency::USD);
        assert_eq!(nightly.times(2).amount(), dec!(200.00));
        assert_eq!(nightly.times(0).amount(), Decimal::ZERO);
    }

    #[test]
    fn test_divide_by_zero() {
        let m = Money::new(dec!(100.00), Currency::USD);
        assert!(matches!(
            m.divide(Decimal::ZERO),
            Err(MoneyError::DivisionByZero)
        ));
    }

    #[test]
    fn test_max_zero_clamps_refund_deltas() {
        let under = Money::new(dec!(-30.00), Currency::USD);
        assert!(under.max_zero().is_zero());

        let over = Money::new(dec!(30.00), Currency::USD);
        assert_eq!(over.max_zero(), over);
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_round_to_currency() {
        let m = Money::new(dec!(10.555), Currency::USD);
        assert_eq!(m.round_to_currency().amount(), dec!(10.56));

        let yen = Money::new(dec!(1000.4), Currency::JPY);
        assert_eq!(yen.round_to_currency().amount(), dec!(1000));
    }

    #[test]
    fn test_bankers_rounding() {
        let m = Money::new(dec!(2.125), Currency::USD);
        assert_eq!(m.round_bankers(2).amount(), dec!(2.12));

        let n = Money::new(dec!(2.135), Currency::USD);
        assert_eq!(n.round_bankers(2).amount(), dec!(2.14));
    }
}

mod display {
    use super::*;

    #[test]
    fn test_display_with_symbol() {
        let m = Money::new(dec!(200.00), Currency::USD);
        assert_eq!(m.to_string(), "$ 200.00");
    }

    #[test]
    fn test_display_zero_decimal_currency() {
        let m = Money::new(dec!(15000), Currency::JPY);
        assert_eq!(m.to_string(), "¥ 15000");
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_round_trip() {
        let m = Money::new(dec!(149.50), Currency::EUR);
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();

        assert_eq!(m, back);
    }
}
