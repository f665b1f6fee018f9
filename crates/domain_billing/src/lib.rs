//! Billing Domain - Invoicing and Payment Reconciliation
//!
//! This crate derives the money side of a stay from its booking history:
//! the billing aggregator materializes an invoice from a finalized
//! booking's charges, and the payment reconciler applies reported payment
//! outcomes against that invoice.
//!
//! # Status model
//!
//! An invoice's status is a pure function of the settled payment sum:
//!
//! ```text
//! settled == 0            -> Issued
//! 0 < settled < total     -> PartiallyPaid
//! settled >= total        -> Paid (overpayment recorded, never truncated)
//! ```
//!
//! Failed payments never count toward the sum; refunds walk the status
//! back down, never below Issued. All amounts are fixed-point decimals.

pub mod invoice;
pub mod payment;
pub mod store;
pub mod aggregator;
pub mod reconciler;
pub mod error;

pub use invoice::{Invoice, InvoiceStatus, LineItem};
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use store::BillingStore;
pub use aggregator::BillingAggregator;
pub use reconciler::{PaymentReconciler, ReconciliationOutcome};
pub use error::BillingError;
