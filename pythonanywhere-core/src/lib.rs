// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # PythonAnywhere Core
//!
//! Core types for the PythonAnywhere client crates.
//!
//! This crate provides the foundational abstractions shared by the web and
//! API access paths:
//!
//! - [`ApiResponse`] - the normalized result record every operation returns
//! - [`ClientError`] - the error taxonomy
//! - Domain models ([`Task`], [`ConsoleSpec`], [`StaticHeader`], [`StaticPath`])
//! - [`Region`] - API base URL selection
//! - Date helpers ([`add_months`], [`parse_expiry_date`])
//!
//! It carries no HTTP dependency; transport lives in `pythonanywhere-client`.

pub mod dates;
pub mod error;
pub mod models;
pub mod region;
pub mod response;

// Re-export error type
pub use error::ClientError;

// Re-export the normalized result record
pub use response::ApiResponse;

// Re-export all model types
pub use models::{Console, ConsoleSpec, StaticHeader, StaticPath, Task, TaskInterval};

// Re-export region selection
pub use region::Region;

// Re-export date helpers
pub use dates::{add_months, parse_expiry_date, EXPIRY_DATE_FORMAT};
