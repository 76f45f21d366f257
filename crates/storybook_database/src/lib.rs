//! Record stores for the storybook service.
//!
//! [`PgStoryStore`] persists storybooks, pages, characters and credit usage
//! in PostgreSQL through Diesel. [`InMemoryStoryStore`] implements the same
//! traits in process memory for tests and database-less local runs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod in_memory;
mod models;
mod postgres;
#[allow(missing_docs)]
pub mod schema;

pub use connection::{MIGRATIONS, PgPool, establish_pool, run_migrations};
pub use in_memory::InMemoryStoryStore;
pub use postgres::PgStoryStore;
