//! Room repository implementation
//!
//! Rooms are owned by the property catalog; the core only reads them and
//! soft-disables via status. A room is never deleted while bookings
//! reference it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for room catalog reads and status updates
#[derive(Debug, Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

/// Operational room status
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "room_status", rename_all = "snake_case")]
pub enum RoomStatusRow {
    Available,
    OutOfService,
}

/// Database row for a room
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomRow {
    pub room_id: Uuid,
    pub property_id: Uuid,
    pub room_number: String,
    pub room_type: Option<String>,
    pub floor: Option<i32>,
    pub capacity: Option<i32>,
    pub nightly_rate: Decimal,
    pub currency: String,
    pub status: RoomStatusRow,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomRepository {
    /// Creates a new RoomRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a room by id
    pub async fn find_room(&self, room_id: Uuid) -> Result<RoomRow, DatabaseError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT room_id, property_id, room_number, room_type, floor, capacity,
                   nightly_rate, currency, status, created_at, updated_at
            FROM rooms
            WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DatabaseError::not_found("Room", room_id))
    }

    /// Lists a property's rooms ordered by room number
    pub async fn list_by_property(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<RoomRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT room_id, property_id, room_number, room_type, floor, capacity,
                   nightly_rate, currency, status, created_at, updated_at
            FROM rooms
            WHERE property_id = $1
            ORDER BY room_number
            "#,
        )
        .bind(property_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Updates a room's operational status (soft-disable)
    pub async fn set_status(
        &self,
        room_id: Uuid,
        status: RoomStatusRow,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET status = $2, updated_at = now()
            WHERE room_id = $1
            "#,
        )
        .bind(room_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Room", room_id));
        }
        Ok(())
    }
}
