//! Support bot HTTP service library crate.
//!
//! Re-exports all modules so the binary (`main.rs`) and the end-to-end
//! test crate can reach `AppState`, `build_router` and the backends.

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod scorer;
pub mod state;
