// src/server/mod.rs

//! Server-side components.
//!
//! This module contains:
//! - `database`   → store handle over SQLite/Postgres
//! - `licensing`  → license creation and verification
//! - `handlers`   → Axum HTTP handlers
//! - `routes`     → Router builder
//! - `api_error`  → error to HTTP response mapping
//! - `logging`    → tracing setup and request logging middleware
//! - `validation` → request validation utilities

pub mod api_error;
pub mod database;
pub mod handlers;
pub mod licensing;
pub mod logging;
pub mod routes;
pub mod validation;

pub use api_error::{CreateFailure, ErrorCode, VerifyFailure};
pub use database::{Database, License};
pub use handlers::{
    create_license_handler, health_handler, verify_license_handler, AppState,
    CreateLicenseRequest, CreateLicenseResponse, VerifyRequest, VerifyResponse,
};
pub use licensing::{create_license, verify_license, verify_license_at, LicenseState, Verification};
pub use logging::{init_tracing, request_logging_middleware};
pub use routes::build_router;
