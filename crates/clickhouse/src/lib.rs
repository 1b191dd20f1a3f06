//! ClickHouse storage for the catalog analytics pipeline.

pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod query;
pub mod rows;
pub mod schema;
pub mod store;

pub use client::*;
pub use config::*;
pub use health::check_connection;
pub use schema::init_schema;
pub use store::ClickHouseStore;
