//! Billing domain errors

use thiserror::Error;

use core_kernel::{BookingId, InvoiceId, Money, MoneyError};
use domain_booking::BookingStatus;

use crate::payment::PaymentStatus;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invoice materialization attempted on a booking that is not billable
    #[error("Booking is not billable in status {status}; invoices require checked_out or no_show")]
    NotBillable { status: BookingStatus },

    /// A non-void invoice already references the booking
    #[error("Booking {0} is already invoiced")]
    AlreadyInvoiced(BookingId),

    /// Void refused because a succeeded payment exists against the invoice
    #[error("Invoice {0} has succeeded payments and cannot be voided")]
    HasPayments(InvoiceId),

    /// Payment application attempted against a void invoice
    #[error("Invoice {0} is void")]
    InvoiceVoid(InvoiceId),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Line items must carry non-negative amounts
    #[error("Line item '{description}' has negative amount {amount}")]
    NegativeLineItem {
        description: String,
        amount: Money,
    },

    /// Payment amounts must be strictly positive
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(Money),

    /// Refund larger than the unrefunded remainder of the payment
    #[error("Refund of {requested} exceeds refundable remainder {refundable}")]
    RefundExceedsPayment {
        requested: Money,
        refundable: Money,
    },

    /// Payment state machine rule violation
    #[error("Payment cannot transition from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
