pub mod api;
pub mod config;
pub mod database;
pub mod identity;
pub mod importer;
pub mod metrics;
pub mod models;
pub mod server;
pub mod store;
