//! QA manager server library.
//!
//! Domain models, the dual JSON-file/PostgreSQL storage backends, business
//! services and the HTTP API, shared by the server and the maintenance
//! binaries.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod file_store;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
pub mod store;
