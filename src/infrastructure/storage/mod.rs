//! Storage infrastructure - PostgreSQL pool and schema migrations

pub mod migrations;
mod postgres;

pub use migrations::{account_migrations, run_migrations, Migration, PostgresMigrator};
pub use postgres::{connect, ping};
