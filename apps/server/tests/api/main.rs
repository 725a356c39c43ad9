//! HTTP API test suite.
//!
//! Runs every route against file-backed services in a temporary directory,
//! plus a database backend that always fails to exercise fallback. No
//! PostgreSQL server is needed.
//!
//! Run with: cargo test --test api

mod test_helpers;

mod test_analysts;
mod test_end_to_end;
mod test_fallback;
mod test_quality;
