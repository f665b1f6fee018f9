//! Payment reconciler
//!
//! Applies reported payment outcomes against invoices and keeps the
//! invoice status in lockstep with the settled sum. The gateway call
//! itself happens elsewhere; this only records what the gateway said.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{InvoiceId, Money, PaymentId};

use crate::error::BillingError;
use crate::invoice::InvoiceStatus;
use crate::payment::{Payment, PaymentMethod};
use crate::store::BillingStore;

/// The state of an invoice after a reconciliation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    /// The payment as recorded
    pub payment: Payment,
    /// The invoice status implied by the new settled sum
    pub invoice_status: InvoiceStatus,
    /// Amount settled beyond the invoice total, surfaced for refund handling
    pub overpayment: Option<Money>,
}

/// Records payment outcomes and reconciles invoice status
pub struct PaymentReconciler {
    store: Arc<BillingStore>,
}

impl PaymentReconciler {
    pub fn new(store: Arc<BillingStore>) -> Self {
        Self { store }
    }

    /// Records a pending payment against an invoice
    ///
    /// The payment does not count toward the settled sum until the gateway
    /// confirms it.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for non-positive amounts
    /// - `InvoiceVoid` when the invoice has been voided
    /// - `Money` on a currency mismatch with the invoice
    pub fn apply_payment(
        &self,
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        external_txn_id: Option<String>,
    ) -> Result<Payment, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::InvalidAmount(amount));
        }

        let account = self.store.account(invoice_id)?;
        let mut account = account.lock().expect("invoice account lock poisoned");

        if account.invoice.is_void() {
            warn!(%invoice_id, "payment refused against void invoice");
            return Err(BillingError::InvoiceVoid(invoice_id));
        }
        // Currency guard; the checked add surfaces any mismatch.
        account.invoice.total.checked_add(&amount)?;

        let payment = Payment::pending(invoice_id, amount, method, external_txn_id);
        account.payments.push(payment.clone());
        drop(account);

        self.store.index_payment(payment.id, invoice_id);

        info!(payment_id = %payment.id, %invoice_id, amount = %amount, "payment recorded");
        Ok(payment)
    }

    /// Confirms a pending payment and recomputes the invoice status
    ///
    /// Overpayment is recorded, not truncated; the delta comes back in the
    /// outcome for the caller's refund handling.
    pub fn confirm_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<ReconciliationOutcome, BillingError> {
        let account = self.store.account_for_payment(payment_id)?;
        let mut account = account.lock().expect("invoice account lock poisoned");

        account.payment_mut(payment_id)?.succeed()?;
        account.recompute_status();

        let settled = account.settled_total();
        let outcome = ReconciliationOutcome {
            payment: account.payment_mut(payment_id)?.clone(),
            invoice_status: account.invoice.status,
            overpayment: account.invoice.overpayment(settled),
        };

        info!(
            %payment_id,
            invoice_status = %outcome.invoice_status,
            "payment confirmed"
        );
        Ok(outcome)
    }

    /// Records a gateway failure; the invoice status is untouched
    pub fn fail_payment(
        &self,
        payment_id: PaymentId,
        reason: impl Into<String>,
    ) -> Result<Payment, BillingError> {
        let account = self.store.account_for_payment(payment_id)?;
        let mut account = account.lock().expect("invoice account lock poisoned");

        let payment = account.payment_mut(payment_id)?;
        payment.fail(reason)?;
        let payment = payment.clone();

        info!(%payment_id, "payment failed");
        Ok(payment)
    }

    /// Refunds part or all of a succeeded payment
    ///
    /// The invoice status walks back down with the settled sum, never
    /// below Issued.
    pub fn refund_payment(
        &self,
        payment_id: PaymentId,
        amount: Money,
    ) -> Result<ReconciliationOutcome, BillingError> {
        let account = self.store.account_for_payment(payment_id)?;
        let mut account = account.lock().expect("invoice account lock poisoned");

        account.payment_mut(payment_id)?.refund(amount)?;
        account.recompute_status();

        let settled = account.settled_total();
        let outcome = ReconciliationOutcome {
            payment: account.payment_mut(payment_id)?.clone(),
            invoice_status: account.invoice.status,
            overpayment: account.invoice.overpayment(settled),
        };

        info!(%payment_id, amount = %amount, "payment refunded");
        Ok(outcome)
    }
}
