//! Invoice aggregate
//!
//! An invoice aggregates the billable amount for a guest, optionally tied
//! 1:1 to a single booking. Its paid/partially-paid status is never stored
//! independently of the payments: `reconciled_status` is the single pure
//! function from the settled sum to the status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use core_kernel::{BookingId, Currency, GuestId, InvoiceId, Money};

use crate::error::BillingError;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being assembled, not yet payable
    Draft,
    /// Issued, nothing settled yet
    Issued,
    /// Some but not all of the total settled
    PartiallyPaid,
    /// Settled sum covers the total
    Paid,
    /// Voided; excluded from the one-invoice-per-booking rule
    Void,
}

impl InvoiceStatus {
    fn name(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A charge line on an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Item ID
    pub id: Uuid,
    /// Description shown to the guest
    pub description: String,
    /// Charge amount, non-negative
    pub amount: Money,
}

impl LineItem {
    /// Creates a new line item
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
        }
    }
}

/// An invoice for a stay's charges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable)
    pub invoice_number: String,
    /// Booking this invoice settles, if any
    pub booking_id: Option<BookingId>,
    /// Guest being billed, if registered
    pub guest_id: Option<GuestId>,
    /// Currency
    pub currency: Currency,
    /// Charge lines
    pub line_items: Vec<LineItem>,
    /// Total amount, sum of line items
    pub total: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Reason recorded when voided
    pub void_reason: Option<String>,
    /// When the invoice was issued
    pub issued_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new draft invoice
    pub fn draft(
        booking_id: Option<BookingId>,
        guest_id: Option<GuestId>,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: InvoiceId::new_v7(),
            invoice_number: generate_invoice_number(),
            booking_id,
            guest_id,
            currency,
            line_items: Vec::new(),
            total: Money::zero(currency),
            status: InvoiceStatus::Draft,
            void_reason: None,
            issued_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a charge line, rejecting negative amounts
    pub fn add_item(&mut self, item: LineItem) -> Result<(), BillingError> {
        if item.amount.is_negative() {
            return Err(BillingError::NegativeLineItem {
                description: item.description,
                amount: item.amount,
            });
        }
        self.total = self.total.checked_add(&item.amount)?;
        self.line_items.push(item);
        self.touch();
        Ok(())
    }

    /// Issues the invoice
    pub fn issue(&mut self) {
        self.status = InvoiceStatus::Issued;
        self.issued_at = Some(Utc::now());
        self.touch();
    }

    /// Voids the invoice, recording the reason
    pub fn void(&mut self, reason: impl Into<String>) {
        self.status = InvoiceStatus::Void;
        self.void_reason = Some(reason.into());
        self.touch();
    }

    /// Returns true if the invoice is void
    pub fn is_void(&self) -> bool {
        self.status == InvoiceStatus::Void
    }

    /// The status implied by a settled payment sum
    ///
    /// This is the only mapping from money to status; callers must never
    /// set PartiallyPaid/Paid by hand. A void invoice stays void.
    pub fn reconciled_status(&self, settled: Money) -> InvoiceStatus {
        if self.status == InvoiceStatus::Void {
            return InvoiceStatus::Void;
        }
        if settled.is_zero() || settled.is_negative() {
            InvoiceStatus::Issued
        } else if settled.amount() < self.total.amount() {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Paid
        }
    }

    /// Remaining amount to settle; zero once fully paid
    pub fn balance_due(&self, settled: Money) -> Money {
        (self.total - settled).max_zero()
    }

    /// The amount settled beyond the total, if any
    pub fn overpayment(&self, settled: Money) -> Option<Money> {
        let delta = settled - self.total;
        delta.is_positive().then_some(delta)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Generates a unique invoice number
fn generate_invoice_number() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("INV-{}", duration.as_millis() % 10_000_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn invoice_with_total(total: rust_decimal::Decimal) -> Invoice {
        let mut invoice = Invoice::draft(Some(BookingId::new()), None, Currency::USD);
        invoice.add_item(LineItem::new("Room stay", usd(total))).unwrap();
        invoice.issue();
        invoice
    }

    #[test]
    fn test_draft_starts_empty() {
        let invoice = Invoice::draft(None, None, Currency::USD);
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.total.is_zero());
        assert!(invoice.invoice_number.starts_with("INV-"));
    }

    #[test]
    fn test_total_is_sum_of_items() {
        let mut invoice = Invoice::draft(None, None, Currency::USD);
        invoice.add_item(LineItem::new("Room stay", usd(dec!(200.00)))).unwrap();
        invoice.add_item(LineItem::new("Minibar", usd(dec!(18.50)))).unwrap();

        assert_eq!(invoice.total.amount(), dec!(218.50));
    }

    #[test]
    fn test_negative_line_item_rejected() {
        let mut invoice = Invoice::draft(None, None, Currency::USD);
        let result = invoice.add_item(LineItem::new("Discount", usd(dec!(-10.00))));

        assert!(matches!(result, Err(BillingError::NegativeLineItem { .. })));
        assert!(invoice.total.is_zero());
    }

    #[test]
    fn test_zero_amount_item_allowed() {
        let mut invoice = Invoice::draft(None, None, Currency::USD);
        invoice
            .add_item(LineItem::new("Complimentary upgrade", usd(dec!(0))))
            .unwrap();
        assert_eq!(invoice.line_items.len(), 1);
    }

    #[test]
    fn test_reconciled_status_is_pure_in_settled_sum() {
        let invoice = invoice_with_total(dec!(300.00));

        assert_eq!(invoice.reconciled_status(usd(dec!(0))), InvoiceStatus::Issued);
        assert_eq!(
            invoice.reconciled_status(usd(dec!(120.00))),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(invoice.reconciled_status(usd(dec!(300.00))), InvoiceStatus::Paid);
        assert_eq!(invoice.reconciled_status(usd(dec!(350.00))), InvoiceStatus::Paid);
    }

    #[test]
    fn test_void_invoice_stays_void() {
        let mut invoice = invoice_with_total(dec!(100.00));
        invoice.void("data entry error");

        assert_eq!(invoice.reconciled_status(usd(dec!(100.00))), InvoiceStatus::Void);
        assert_eq!(invoice.void_reason.as_deref(), Some("data entry error"));
    }

    #[test]
    fn test_balance_due_and_overpayment() {
        let invoice = invoice_with_total(dec!(300.00));

        assert_eq!(invoice.balance_due(usd(dec!(120.00))).amount(), dec!(180.00));
        assert!(invoice.balance_due(usd(dec!(350.00))).is_zero());

        assert!(invoice.overpayment(usd(dec!(300.00))).is_none());
        assert_eq!(
            invoice.overpayment(usd(dec!(350.00))).unwrap().amount(),
            dec!(50.00)
        );
    }
}
