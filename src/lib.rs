//! hwbind - license key server with hardware binding.
//!
//! Licenses are created by the operator with an expiry date and are bound to
//! the hardware identifier of the first machine that verifies them.
//!
//! # Features
//!
//! - `sqlite` - SQLite database backend. Enabled by default.
//! - `postgres` - PostgreSQL database backend.
//!
//! # Example
//!
//! ```toml
//! # Use defaults (sqlite)
//! hwbind = { path = "." }
//!
//! # Server with PostgreSQL
//! hwbind = { path = ".", features = ["postgres"] }
//! ```

pub mod config;
pub mod errors;
pub mod timestamp;

pub mod server;
