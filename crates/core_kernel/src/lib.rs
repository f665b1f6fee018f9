//! Core Kernel - Foundational types and utilities for the lodging system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Stay-interval types with half-open date semantics
//! - Common identifiers and value objects

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{StayPeriod, Timezone, TemporalError};
pub use identifiers::{
    PropertyId, RoomId, BookingId, GuestId, InvoiceId, PaymentId,
};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable};
