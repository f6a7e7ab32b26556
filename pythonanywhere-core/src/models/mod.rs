//! Domain models for the PythonAnywhere account surface.
//!
//! - [`Task`] / [`TaskInterval`] - scheduled tasks
//! - [`ConsoleSpec`] / [`Console`] - interactive consoles
//! - [`StaticHeader`] / [`StaticPath`] - per-webapp static configuration

mod console;
mod task;
mod webapp;

pub use console::{Console, ConsoleSpec};
pub use task::{Task, TaskInterval};
pub use webapp::{StaticHeader, StaticPath};
