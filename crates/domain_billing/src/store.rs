//! Shared billing state
//!
//! Invoices and their payments live together under one mutex per invoice,
//! which serializes all invoice/payment mutations per invoice. Bookings
//! are mapped to their single non-void invoice so the
//! one-invoice-per-booking rule has an atomic check-and-insert.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use core_kernel::{BookingId, InvoiceId, Money, PaymentId};

use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::payment::Payment;

/// An invoice together with all payments applied against it
#[derive(Debug, Clone)]
pub(crate) struct InvoiceAccount {
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
}

impl InvoiceAccount {
    /// Sum of the net settled amounts of all payments
    pub fn settled_total(&self) -> Money {
        self.payments
            .iter()
            .fold(Money::zero(self.invoice.currency), |acc, p| {
                acc + p.settled_amount()
            })
    }

    /// True if any payment has succeeded (refunded payments once did)
    pub fn has_succeeded_payment(&self) -> bool {
        use crate::payment::PaymentStatus;
        self.payments
            .iter()
            .any(|p| matches!(p.status, PaymentStatus::Succeeded | PaymentStatus::Refunded))
    }

    pub fn payment_mut(&mut self, payment_id: PaymentId) -> Result<&mut Payment, BillingError> {
        self.payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| BillingError::PaymentNotFound(payment_id.to_string()))
    }

    /// Re-derives the invoice status from the settled sum
    pub fn recompute_status(&mut self) {
        let settled = self.settled_total();
        self.invoice.status = self.invoice.reconciled_status(settled);
        self.invoice.updated_at = chrono::Utc::now();
    }
}

/// In-memory billing ledger shared by the aggregator and the reconciler
#[derive(Debug, Default)]
pub struct BillingStore {
    accounts: RwLock<HashMap<InvoiceId, Arc<Mutex<InvoiceAccount>>>>,
    by_booking: RwLock<HashMap<BookingId, InvoiceId>>,
    payment_index: RwLock<HashMap<PaymentId, InvoiceId>>,
}

impl BillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly materialized invoice
    ///
    /// When the invoice references a booking, the booking->invoice mapping
    /// is claimed under one write lock, so two concurrent materializations
    /// of the same booking cannot both succeed.
    pub(crate) fn insert_invoice(&self, invoice: Invoice) -> Result<(), BillingError> {
        if let Some(booking_id) = invoice.booking_id {
            let mut by_booking = self.by_booking.write().expect("billing store lock poisoned");
            if by_booking.contains_key(&booking_id) {
                return Err(BillingError::AlreadyInvoiced(booking_id));
            }
            by_booking.insert(booking_id, invoice.id);
        }

        self.accounts
            .write()
            .expect("billing store lock poisoned")
            .insert(
                invoice.id,
                Arc::new(Mutex::new(InvoiceAccount {
                    invoice,
                    payments: Vec::new(),
                })),
            );
        Ok(())
    }

    /// Releases the booking->invoice claim after a void
    pub(crate) fn unclaim_booking(&self, booking_id: BookingId) {
        self.by_booking
            .write()
            .expect("billing store lock poisoned")
            .remove(&booking_id);
    }

    pub(crate) fn account(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Arc<Mutex<InvoiceAccount>>, BillingError> {
        self.accounts
            .read()
            .expect("billing store lock poisoned")
            .get(&invoice_id)
            .map(Arc::clone)
            .ok_or_else(|| BillingError::InvoiceNotFound(invoice_id.to_string()))
    }

    pub(crate) fn account_for_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<Arc<Mutex<InvoiceAccount>>, BillingError> {
        let invoice_id = self
            .payment_index
            .read()
            .expect("billing store lock poisoned")
            .get(&payment_id)
            .copied()
            .ok_or_else(|| BillingError::PaymentNotFound(payment_id.to_string()))?;
        self.account(invoice_id)
    }

    pub(crate) fn index_payment(&self, payment_id: PaymentId, invoice_id: InvoiceId) {
        self.payment_index
            .write()
            .expect("billing store lock poisoned")
            .insert(payment_id, invoice_id);
    }

    /// Returns a snapshot of the invoice
    pub fn invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, BillingError> {
        let account = self.account(invoice_id)?;
        let account = account.lock().expect("invoice account lock poisoned");
        Ok(account.invoice.clone())
    }

    /// Returns the non-void invoice referencing the booking, if any
    pub fn invoice_for_booking(&self, booking_id: BookingId) -> Option<Invoice> {
        let invoice_id = *self
            .by_booking
            .read()
            .expect("billing store lock poisoned")
            .get(&booking_id)?;
        self.invoice(invoice_id).ok()
    }

    /// Returns a snapshot of the payment
    pub fn payment(&self, payment_id: PaymentId) -> Result<Payment, BillingError> {
        let account = self.account_for_payment(payment_id)?;
        let account = account.lock().expect("invoice account lock poisoned");
        account
            .payments
            .iter()
            .find(|p| p.id == payment_id)
            .cloned()
            .ok_or_else(|| BillingError::PaymentNotFound(payment_id.to_string()))
    }

    /// Returns the settled payment sum for an invoice
    pub fn settled_total(&self, invoice_id: InvoiceId) -> Result<Money, BillingError> {
        let account = self.account(invoice_id)?;
        let account = account.lock().expect("invoice account lock poisoned");
        Ok(account.settled_total())
    }
}
