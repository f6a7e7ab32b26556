// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # PythonAnywhere Client
//!
//! Web and API clients for the PythonAnywhere hosting platform.
//!
//! Two access paths share one account:
//!
//! - [`WebClient`] drives the platform's HTML pages with a form-authenticated
//!   session: login, CSRF-token extraction, page scraping, form-POST
//!   mutations.
//! - [`ApiClient`] calls the token-authenticated REST API: consoles, files,
//!   scheduled tasks, web-app lifecycle and static configuration.
//!
//! Every operation returns the normalized
//! [`ApiResponse`](pythonanywhere_core::ApiResponse) record; failures are
//! values, never panics, and nothing is retried.
//!
//! ```no_run
//! use pythonanywhere_client::WebClient;
//!
//! # async fn run() -> Result<(), pythonanywhere_core::ClientError> {
//! let web = WebClient::new("sam", "hunter2")?;
//! let login = web.login().await;
//! assert!(!login.error);
//!
//! let expiry = web.get_app_expiry_date("sam").await;
//! println!("{:?}", expiry.data_str("expiry_date"));
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod normalize;
pub mod scrape;
pub mod session;
pub mod web;

pub use api::ApiClient;
pub use session::{Credentials, FormCredentials, Redirects, Session, SessionConfig, TokenCredentials};
pub use web::WebClient;
