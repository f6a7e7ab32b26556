// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # PythonAnywhere Console Starter
//!
//! Consoles created through the API exist but are not running until their
//! interactive frame page has been opened once in a browser. This crate
//! performs that step headlessly: it injects a web session's cookies, loads
//! the console frame, and waits for the terminal to finish initializing.
//!
//! ```no_run
//! use pythonanywhere_console::ConsoleStarter;
//! # async fn run(cookies: std::collections::BTreeMap<String, String>) {
//! let starter = ConsoleStarter::new();
//! let started = starter.start_console("sam", 1234, &cookies).await;
//! assert!(!started.error);
//! # }
//! ```

pub mod starter;

pub use starter::{ConsoleStarter, StarterConfig, CONSOLE_READY_SELECTOR};
