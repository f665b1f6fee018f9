//! Payment record
//!
//! A payment is an application of funds against exactly one invoice. The
//! gateway integration lives outside the core; only reported outcomes are
//! recorded here. A succeeded payment is immutable except for the refund
//! transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{InvoiceId, Money, PaymentId};

use crate::error::BillingError;

/// Payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    BankTransfer,
    Cash,
    DigitalWallet,
    Check,
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Recorded, awaiting gateway confirmation; does not count
    Pending,
    /// Confirmed by the gateway; counts toward the settled sum
    Succeeded,
    /// Rejected by the gateway; never counts
    Failed,
    /// Fully refunded; contributes nothing
    Refunded,
}

impl PaymentStatus {
    fn name(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A payment applied against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    /// Payment amount, strictly positive
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// Status
    pub status: PaymentStatus,
    /// Gateway transaction reference
    pub external_txn_id: Option<String>,
    /// Reason reported on failure
    pub failure_reason: Option<String>,
    /// Accumulated refunds against this payment
    pub refunded: Money,
    /// When the gateway confirmed the payment
    pub processed_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Records a pending payment awaiting gateway confirmation
    pub fn pending(
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        external_txn_id: Option<String>,
    ) -> Self {
        Self {
            id: PaymentId::new_v7(),
            invoice_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            external_txn_id,
            failure_reason: None,
            refunded: Money::zero(amount.currency()),
            processed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Marks the payment succeeded on gateway confirmation
    pub fn succeed(&mut self) -> Result<(), BillingError> {
        if self.status != PaymentStatus::Pending {
            return Err(BillingError::InvalidPaymentTransition {
                from: self.status,
                to: PaymentStatus::Succeeded,
            });
        }
        self.status = PaymentStatus::Succeeded;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the payment failed
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), BillingError> {
        if self.status != PaymentStatus::Pending {
            return Err(BillingError::InvalidPaymentTransition {
                from: self.status,
                to: PaymentStatus::Failed,
            });
        }
        self.status = PaymentStatus::Failed;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Applies a refund against a succeeded payment
    ///
    /// # Errors
    ///
    /// Fails unless the payment succeeded and `amount` does not exceed the
    /// unrefunded remainder.
    pub fn refund(&mut self, amount: Money) -> Result<(), BillingError> {
        if self.status != PaymentStatus::Succeeded {
            return Err(BillingError::InvalidPaymentTransition {
                from: self.status,
                to: PaymentStatus::Refunded,
            });
        }
        if !amount.is_positive() {
            return Err(BillingError::InvalidAmount(amount));
        }

        let refundable = self.refundable_remainder();
        if amount.amount() > refundable.amount() {
            return Err(BillingError::RefundExceedsPayment {
                requested: amount,
                refundable,
            });
        }

        self.refunded = self.refunded.checked_add(&amount)?;
        if self.refunded == self.amount {
            self.status = PaymentStatus::Refunded;
        }
        Ok(())
    }

    /// The net amount this payment contributes to the settled sum
    pub fn settled_amount(&self) -> Money {
        match self.status {
            PaymentStatus::Succeeded | PaymentStatus::Refunded => self.amount - self.refunded,
            PaymentStatus::Pending | PaymentStatus::Failed => Money::zero(self.amount.currency()),
        }
    }

    /// The amount still available to refund
    pub fn refundable_remainder(&self) -> Money {
        self.amount - self.refunded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn test_payment() -> Payment {
        Payment::pending(
            InvoiceId::new(),
            usd(dec!(200.00)),
            PaymentMethod::CreditCard,
            Some("txn_0042".to_string()),
        )
    }

    #[test]
    fn test_pending_contributes_nothing() {
        let payment = test_payment();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.settled_amount().is_zero());
    }

    #[test]
    fn test_succeed_counts_full_amount() {
        let mut payment = test_payment();
        payment.succeed().unwrap();

        assert_eq!(payment.settled_amount().amount(), dec!(200.00));
        assert!(payment.processed_at.is_some());
    }

    #[test]
    fn test_failed_never_counts() {
        let mut payment = test_payment();
        payment.fail("card declined").unwrap();

        assert!(payment.settled_amount().is_zero());
        assert_eq!(payment.failure_reason.as_deref(), Some("card declined"));
    }

    #[test]
    fn test_succeed_twice_rejected() {
        let mut payment = test_payment();
        payment.succeed().unwrap();

        assert!(matches!(
            payment.succeed(),
            Err(BillingError::InvalidPaymentTransition { .. })
        ));
    }

    #[test]
    fn test_partial_refund_keeps_succeeded() {
        let mut payment = test_payment();
        payment.succeed().unwrap();
        payment.refund(usd(dec!(50.00))).unwrap();

        assert_eq!(payment.status, PaymentStatus::Succeeded);
        assert_eq!(payment.settled_amount().amount(), dec!(150.00));
        assert_eq!(payment.refundable_remainder().amount(), dec!(150.00));
    }

    #[test]
    fn test_full_refund_flips_status() {
        let mut payment = test_payment();
        payment.succeed().unwrap();
        payment.refund(usd(dec!(200.00))).unwrap();

        assert_eq!(payment.status, PaymentStatus::Refunded);
        assert!(payment.settled_amount().is_zero());
    }

    #[test]
    fn test_refund_cannot_exceed_remainder() {
        let mut payment = test_payment();
        payment.succeed().unwrap();
        payment.refund(usd(dec!(150.00))).unwrap();

        let result = payment.refund(usd(dec!(100.00)));
        assert!(matches!(
            result,
            Err(BillingError::RefundExceedsPayment { .. })
        ));
    }

    #[test]
    fn test_refund_requires_success() {
        let mut payment = test_payment();
        let result = payment.refund(usd(dec!(10.00)));
        assert!(matches!(
            result,
            Err(BillingError::InvalidPaymentTransition { .. })
        ));
    }
}
