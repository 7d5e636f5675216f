//! Soft-deletable storage.
//!
//! Rows are never physically removed. Deleting a row sets its deletion marker,
//! which hides it from scoped reads; restoring clears the marker again. The
//! marker is only ever touched from inside this crate.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{ArticleId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::{PgQuery, PgRecord, PostgresStore};
pub use record::Record;
pub use store::SoftDeleteStore;
