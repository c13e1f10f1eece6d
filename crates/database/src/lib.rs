//! # Kharid Database Crate
//!
//! This crate is the data-access layer for purchase-request tracking. It owns
//! every SQL statement in the system and presents a high-level, typed API to
//! the rest of the workspace.
//!
//! ## Architectural Principles
//!
//! - **Single point of SQL:** All statements against `purchase_requests` and
//!   `request_items` live here, behind `RequestRepository`. Callers never see
//!   raw SQL or raw driver errors.
//! - **Pooled & bounded:** Connections come from a `PgPool` with configured
//!   minimum/maximum bounds and a hard acquire timeout, so no operation can
//!   block indefinitely waiting for a connection. The pool carries its own
//!   state; there is no process-wide "connected" flag to fall out of sync.
//! - **Scoped transactions:** The one multi-statement operation
//!   (`save_request`) runs inside an explicit transaction that commits only
//!   when both the request and all of its items are in, and rolls back on any
//!   failure. Connections return to the pool on every exit path.
//!
//! ## Public API
//!
//! - `connect`: builds the bounded connection pool from settings.
//! - `run_migrations`: applies the schema migrations, ensuring the two tables
//!   and their indexes exist before first use.
//! - `RequestRepository`: all read/write/search/statistics operations.
//! - `DbError`: the error taxonomy returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod filter;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{
    DuplicateRequest, ItemMatch, PurchaseRequest, RequestItem, RequestOverview, RequestRepository,
    RequestWithItems,
};
