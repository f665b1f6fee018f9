//! Billing aggregator
//!
//! Materializes invoices from finalized bookings. Whether a booking is
//! billable is decided by the booking state machine (checked-out or
//! no-show); what it is billed is decided by the line items the caller
//! hands in, since pricing and no-show policy live outside the core.

use std::sync::Arc;

use tracing::{info, warn};

use core_kernel::InvoiceId;
use domain_booking::Booking;

use crate::error::BillingError;
use crate::invoice::{Invoice, LineItem};
use crate::store::BillingStore;

/// Derives invoices from bookings and ad-hoc charges
pub struct BillingAggregator {
    store: Arc<BillingStore>,
}

impl BillingAggregator {
    pub fn new(store: Arc<BillingStore>) -> Self {
        Self { store }
    }

    /// Materializes an invoice from a finalized booking
    ///
    /// Callers obtain the booking snapshot under its transition lock (see
    /// `AllocationService::with_booking`), so the booking cannot be
    /// cancelled while it is being invoiced.
    ///
    /// # Errors
    ///
    /// - `NotBillable` unless the booking is checked out or a no-show
    /// - `NegativeLineItem` when any amount is negative
    /// - `AlreadyInvoiced` when a non-void invoice references the booking
    pub fn materialize_invoice(
        &self,
        booking: &Booking,
        line_items: Vec<LineItem>,
    ) -> Result<Invoice, BillingError> {
        if !booking.status.is_billable() {
            warn!(booking_id = %booking.id, status = %booking.status, "invoice refused");
            return Err(BillingError::NotBillable {
                status: booking.status,
            });
        }

        let mut invoice = Invoice::draft(
            Some(booking.id),
            booking.guest_id,
            booking.nightly_rate.currency(),
        );
        for item in line_items {
            invoice.add_item(item)?;
        }
        invoice.issue();

        self.store.insert_invoice(invoice.clone())?;

        info!(
            invoice_id = %invoice.id,
            booking_id = %booking.id,
            total = %invoice.total,
            "invoice materialized"
        );
        Ok(invoice)
    }

    /// Builds the room-night charge line for a booking
    pub fn stay_line_item(&self, booking: &Booking) -> LineItem {
        LineItem::new(
            format!(
                "Room stay {} ({} night{})",
                booking.period,
                booking.nights(),
                if booking.nights() == 1 { "" } else { "s" }
            ),
            booking.stay_charge(),
        )
    }

    /// Voids an invoice, releasing its booking for re-invoicing
    ///
    /// # Errors
    ///
    /// Returns `HasPayments` when a succeeded payment exists against the
    /// invoice; voiding paid money is the refund path's job.
    pub fn void_invoice(
        &self,
        invoice_id: InvoiceId,
        reason: impl Into<String>,
    ) -> Result<Invoice, BillingError> {
        let account = self.store.account(invoice_id)?;
        let mut account = account.lock().expect("invoice account lock poisoned");

        if account.invoice.is_void() {
            return Ok(account.invoice.clone());
        }
        if account.has_succeeded_payment() {
            return Err(BillingError::HasPayments(invoice_id));
        }

        account.invoice.void(reason);
        if let Some(booking_id) = account.invoice.booking_id {
            self.store.unclaim_booking(booking_id);
        }

        info!(%invoice_id, "invoice voided");
        Ok(account.invoice.clone())
    }
}
