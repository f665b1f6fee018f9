//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL persistence for the lodging core
//! using SQLx. It is the storage side of the concurrency story: the
//! application-level interval index is backed here by a `btree_gist`
//! exclusion constraint on room intervals, which stays authoritative once
//! multiple service instances run against the same database.
//!
//! # Architecture
//!
//! The crate follows the repository pattern, keeping SQL and row mapping
//! out of the domain crates. Row types are local to each repository;
//! domain aggregates never leak into queries.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool};
//!
//! let pool = create_pool(DatabaseConfig::from_env()?).await?;
//! let bookings = BookingRepository::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;

pub use pool::{Database, DatabasePool, DatabaseConfig, create_pool, create_pool_from_url};
pub use error::DatabaseError;
