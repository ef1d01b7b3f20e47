#![doc = "The `tasknest` library crate."]
#![doc = ""]
#![doc = "This crate contains all the core business logic for the TaskNest service:"]
#![doc = "domain models, the credential and session-token machinery, the per-request"]
#![doc = "authentication gate and ownership checks, the storage boundary, routing"]
#![doc = "configuration, and error handling. It is used by the main binary"]
#![doc = "(`main.rs`) to construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
