//! Billing repository implementation
//!
//! Persists invoices with their line items and the payments applied
//! against them. An invoice and its lines are written in one transaction;
//! the partial unique index on `invoices (booking_id) WHERE status <>
//! 'void'` is the storage guarantee that a booking carries at most one
//! live invoice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for invoices, line items, and payments
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
pub enum InvoiceStatusRow {
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Void,
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatusRow {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

/// Database row for an invoice
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub booking_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub currency: String,
    pub total: Decimal,
    pub status: InvoiceStatusRow,
    pub void_reason: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub refunded: Decimal,
    pub currency: String,
    pub method: String,
    pub status: PaymentStatusRow,
    pub external_txn_id: Option<String>,
    pub failure_reason: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new invoice
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub booking_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub currency: String,
    pub total: Decimal,
}

/// Data for creating a new line item
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub line_item_id: Uuid,
    pub description: String,
    pub amount: Decimal,
}

/// Data for creating a new payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub external_txn_id: Option<String>,
}

impl BillingRepository {
    /// Creates a new BillingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates an issued invoice with its line items in a single transaction
    ///
    /// Either the invoice and all of its lines land together, or nothing
    /// does. The partial unique index rejects a second live invoice for
    /// the same booking (surfaced as `DuplicateEntry`).
    pub async fn create_invoice(
        &self,
        invoice: NewInvoice,
        line_items: Vec<NewLineItem>,
    ) -> Result<Uuid, DatabaseError> {
        // Verify the total matches the lines before touching the database.
        let line_total: Decimal = line_items.iter().map(|li| li.amount).sum();
        if line_total != invoice.total {
            return Err(DatabaseError::ConstraintViolation(format!(
                "Invoice total {} does not match line item sum {}",
                invoice.total, line_total
            )));
        }

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, booking_id, guest_id, currency,
                total, status, issued_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, 'issued', $7, $7, $7)
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(invoice.invoice_number)
        .bind(invoice.booking_id)
        .bind(invoice.guest_id)
        .bind(invoice.currency)
        .bind(invoice.total)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in line_items {
            sqlx::query(
                r#"
                INSERT INTO invoice_line_items (
                    line_item_id, invoice_id, description, amount, created_at
                ) VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.line_item_id)
            .bind(invoice.invoice_id)
            .bind(item.description)
            .bind(item.amount)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(invoice.invoice_id)
    }

    /// Retrieves an invoice by id
    pub async fn find_invoice(&self, invoice_id: Uuid) -> Result<InvoiceRow, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT invoice_id, invoice_number, booking_id, guest_id, currency,
                   total, status, void_reason, issued_at, created_at, updated_at
            FROM invoices
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DatabaseError::not_found("Invoice", invoice_id))
    }

    /// Updates an invoice's status, recording the void reason when given
    pub async fn update_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatusRow,
        void_reason: Option<String>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2,
                void_reason = COALESCE($3, void_reason),
                updated_at = now()
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(status)
        .bind(void_reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", invoice_id));
        }
        Ok(())
    }

    /// Inserts a pending payment
    pub async fn insert_payment(&self, payment: NewPayment) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, invoice_id, amount, currency, method,
                status, external_txn_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, 'pending', $6, now())
            "#,
        )
        .bind(payment.payment_id)
        .bind(payment.invoice_id)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(payment.method)
        .bind(payment.external_txn_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a payment's status and refund accumulation
    pub async fn update_payment(
        &self,
        payment_id: Uuid,
        status: PaymentStatusRow,
        refunded: Decimal,
        failure_reason: Option<String>,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2,
                refunded = $3,
                failure_reason = COALESCE($4, failure_reason),
                processed_at = CASE
                    WHEN $2 = 'succeeded'::payment_status AND processed_at IS NULL THEN now()
                    ELSE processed_at
                END
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .bind(status)
        .bind(refunded)
        .bind(failure_reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Payment", payment_id));
        }
        Ok(())
    }

    /// Lists an invoice's payments in application order
    pub async fn find_payments(&self, invoice_id: Uuid) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT payment_id, invoice_id, amount, refunded, currency, method,
                   status, external_txn_id, failure_reason, processed_at, created_at
            FROM payments
            WHERE invoice_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Returns the settled sum for an invoice
    ///
    /// Only succeeded and refunded payments count, net of refunds; the
    /// invoice's stored status must always agree with this number.
    pub async fn settled_total(&self, invoice_id: Uuid) -> Result<Decimal, DatabaseError> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount - refunded), 0)
            FROM payments
            WHERE invoice_id = $1
              AND status IN ('succeeded', 'refunded')
            "#,
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
