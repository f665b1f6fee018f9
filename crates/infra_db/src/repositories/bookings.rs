//! Booking repository implementation
//!
//! Persists booking rows and the blocking intervals behind the interval
//! index. `reserve_interval` is the atomic check-and-insert: a single
//! statement that inserts only when no overlap exists, with the
//! `room_intervals_no_overlap` exclusion constraint as the final arbiter
//! across service instances.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for bookings and their blocking intervals
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
pub enum BookingStatusRow {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

/// Database row for a booking
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: Uuid,
    pub property_id: Uuid,
    pub room_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: BookingStatusRow,
    pub nightly_rate: Decimal,
    pub currency: String,
    pub cancellation_reason: Option<String>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for a blocking interval
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IntervalRow {
    pub room_id: Uuid,
    pub booking_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

/// Data for creating a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_id: Uuid,
    pub property_id: Uuid,
    pub room_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nightly_rate: Decimal,
    pub currency: String,
}

impl BookingRepository {
    /// Creates a new BookingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a pending booking
    pub async fn insert_booking(&self, booking: NewBooking) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                booking_id, property_id, room_id, guest_id, guest_name,
                check_in, check_out, status, nightly_rate, currency,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, now(), now())
            "#,
        )
        .bind(booking.booking_id)
        .bind(booking.property_id)
        .bind(booking.room_id)
        .bind(booking.guest_id)
        .bind(booking.guest_name)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.nightly_rate)
        .bind(booking.currency)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieves a booking by id
    pub async fn find_booking(&self, booking_id: Uuid) -> Result<BookingRow, DatabaseError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT booking_id, property_id, room_id, guest_id, guest_name,
                   check_in, check_out, status, nightly_rate, currency,
                   cancellation_reason, checked_in_at, checked_out_at,
                   created_at, updated_at
            FROM bookings
            WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DatabaseError::not_found("Booking", booking_id))
    }

    /// Updates a booking's status
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        status: BookingStatusRow,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = now()
            WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Booking", booking_id));
        }
        Ok(())
    }

    /// Atomically reserves a blocking interval for a room
    ///
    /// The insert carries its own overlap check, so check-and-insert is a
    /// single statement; the exclusion constraint remains the backstop
    /// for anything that slips between instances.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::IntervalOverlap` when the room is already
    /// blocked for an overlapping range.
    pub async fn reserve_interval(
        &self,
        room_id: Uuid,
        booking_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO room_intervals (room_id, booking_id, check_in, check_out)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM room_intervals
                WHERE room_id = $1
                  AND check_in < $4
                  AND $3 < check_out
            )
            "#,
        )
        .bind(room_id)
        .bind(booking_id)
        .bind(check_in)
        .bind(check_out)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(%room_id, %booking_id, "interval reservation lost to an existing block");
            return Err(DatabaseError::IntervalOverlap(format!(
                "room {} already blocked between {} and {}",
                room_id, check_in, check_out
            )));
        }
        Ok(())
    }

    /// Removes a booking's blocking interval; returns true if one existed
    pub async fn release_interval(
        &self,
        room_id: Uuid,
        booking_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM room_intervals
            WHERE room_id = $1 AND booking_id = $2
            "#,
        )
        .bind(room_id)
        .bind(booking_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Moves a booking's interval to a new range as one transaction
    ///
    /// The delete and conditional re-insert commit together; when the new
    /// range conflicts the transaction rolls back and the old interval is
    /// untouched.
    pub async fn reschedule_interval(
        &self,
        room_id: Uuid,
        booking_id: Uuid,
        new_check_in: NaiveDate,
        new_check_out: NaiveDate,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM room_intervals
            WHERE room_id = $1 AND booking_id = $2
            "#,
        )
        .bind(room_id)
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO room_intervals (room_id, booking_id, check_in, check_out)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM room_intervals
                WHERE room_id = $1
                  AND check_in < $4
                  AND $3 < check_out
            )
            "#,
        )
        .bind(room_id)
        .bind(booking_id)
        .bind(new_check_in)
        .bind(new_check_out)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::IntervalOverlap(format!(
                "room {} already blocked between {} and {}",
                room_id, new_check_in, new_check_out
            )));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Returns the intervals overlapping a date range, ordered by check-in
    pub async fn find_overlapping(
        &self,
        room_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<IntervalRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, IntervalRow>(
            r#"
            SELECT room_id, booking_id, check_in, check_out
            FROM room_intervals
            WHERE room_id = $1
              AND check_in < $3
              AND $2 < check_out
            ORDER BY check_in
            "#,
        )
        .bind(room_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
