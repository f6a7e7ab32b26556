//! Web client: form-authenticated operations against the platform's HTML
//! pages.
//!
//! Success criteria here mirror the vendor's undocumented behavior exactly
//! (the bare `"OK"` reload body, the `status == "success"` JSON field, the
//! 302-only logout). They are preserved literally rather than generalized;
//! there is no vendor contract to generalize against.

use reqwest::header::REFERER;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use pythonanywhere_core::{dates, ApiResponse, ClientError, Task};

use crate::normalize::{self, expect_empty, expect_json, into_response};
use crate::scrape;
use crate::session::{FormCredentials, Redirects, Session, SessionConfig};

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the platform's web surface.
pub const BASE_URL: &str = "https://www.pythonanywhere.com";

/// Login page.
const LOGIN_PATH: &str = "/login/";

/// Logout endpoint.
const LOGOUT_PATH: &str = "/logout/";

/// Form field carrying the login wizard step.
const LOGIN_STEP_FIELD: (&str, &str) = ("login_view-current_step", "auth");

/// CSRF header used by the task endpoints.
const CSRF_HEADER: &str = "X-CSRFToken";

// Diagnostic messages, kept stable because callers match on them.
const MSG_TOKEN_EXTRACTION: &str = "CSRF token extraction failed";
const MSG_LOGIN_FAILED: &str = "Login failed";
const MSG_BAD_CREDENTIALS: &str = "The user name or password is incorrect";
const MSG_GET_APP_PAGE: &str = "Get app page failed";
const MSG_EXTRACTING: &str = "Extracting failed";
const MSG_LOGOUT_FAILED: &str = "Logout failed";
const MSG_RELOAD_FAILED: &str = "Reload failed";
const MSG_EXTEND_APP_FAILED: &str = "Extend app failed";
const MSG_EXTEND_TASK_FAILED: &str = "Extend task failed";
const MSG_CREATE_TASK_FAILED: &str = "Create task failed";
const MSG_DELETE_TASK_FAILED: &str = "Delete task failed";
const MSG_GET_TASKS_FAILED: &str = "Get tasks failed";
const MSG_PERMS_FAILED: &str = "Permissions check failed";

// ============================================================================
// Web Client
// ============================================================================

/// Form-authenticated client for the platform's HTML pages.
///
/// Operations return the normalized [`ApiResponse`]; mutating operations
/// require a prior successful [`login`](Self::login) (or imported cookies
/// from one) and fetch a fresh CSRF token first. A token-retrieval failure
/// is returned verbatim, never retried.
pub struct WebClient {
    username: String,
    password: String,
    base_url: String,
    session: Session,
}

impl std::fmt::Debug for WebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the password.
        f.debug_struct("WebClient")
            .field("username", &self.username)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl WebClient {
    /// Creates a client with the default session configuration.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_config(username, password, &SessionConfig::default())
    }

    /// Creates a client with a caller-supplied user agent and timeout.
    pub fn with_config(
        username: impl Into<String>,
        password: impl Into<String>,
        config: &SessionConfig,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            username: username.into(),
            password: password.into(),
            base_url: BASE_URL.to_string(),
            session: Session::new(config, Box::new(FormCredentials))?,
        })
    }

    /// Points the client at a different web surface, e.g. a local stand-in.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds an absolute URL from a path on the web surface.
    pub fn create_url(&self, uri: &str) -> String {
        format!("{}{uri}", self.base_url)
    }

    fn user_url(&self, suffix: &str) -> String {
        self.create_url(&format!("/user/{}{suffix}", self.username))
    }

    fn webapps_url(&self) -> String {
        self.user_url("/webapps/")
    }

    fn tasks_tab_url(&self) -> String {
        self.user_url("/tasks_tab/")
    }

    fn schedule_api_url(&self, suffix: &str) -> String {
        self.create_url(&format!("/api/v0/user/{}/schedule/{suffix}", self.username))
    }

    /// Exports the session's cookies for persistence or the console starter.
    pub fn cookies(&self) -> std::collections::BTreeMap<String, String> {
        self.session.cookies()
    }

    /// Imports cookies saved from an earlier session.
    pub fn load_cookies(&self, cookies: std::collections::BTreeMap<String, String>) {
        self.session.load_cookies(cookies);
    }

    async fn get_page(&self, url: &str) -> Result<(StatusCode, String), ClientError> {
        let response = self
            .session
            .send(self.session.http().get(url), Redirects::Follow)
            .await?;
        normalize::read(response).await
    }

    /// Fetches the webapps page and extracts a fresh CSRF token.
    #[instrument(skip(self))]
    pub async fn get_csrf_token(&self) -> ApiResponse {
        into_response(self.csrf_token_inner().await)
    }

    async fn csrf_token_inner(&self) -> Result<ApiResponse, ClientError> {
        let (status, body) = self.get_page(&self.webapps_url()).await?;
        if status != StatusCode::OK {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_GET_APP_PAGE));
        }
        match scrape::extract_csrf_token(&body) {
            Some(token) => Ok(ApiResponse::ok(
                status.as_u16(),
                json!({ "csrf_token": token }),
            )),
            None => Ok(ApiResponse::fail(status.as_u16(), MSG_TOKEN_EXTRACTION)),
        }
    }

    /// Returns the token from a fresh CSRF fetch, or the fetch's failure
    /// response unchanged.
    async fn fresh_csrf_token(&self) -> Result<String, ApiResponse> {
        let response = self.get_csrf_token().await;
        if response.error {
            return Err(response);
        }
        match response.data_str("csrf_token") {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(ApiResponse::from(&ClientError::TokenExtraction)),
        }
    }

    /// Logs in with the client's credentials.
    ///
    /// GETs the login page, extracts the hidden CSRF token, POSTs the
    /// credential form, and follows the post-login redirect so the session
    /// cookies set on the 302 hop are captured. A credential rejection is
    /// reported distinctly from a transport failure.
    #[instrument(skip(self))]
    pub async fn login(&self) -> ApiResponse {
        into_response(self.login_inner().await)
    }

    async fn login_inner(&self) -> Result<ApiResponse, ClientError> {
        let url = self.create_url(LOGIN_PATH);
        let (status, body) = self.get_page(&url).await?;
        let Some(token) = scrape::extract_csrf_token(&body) else {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_TOKEN_EXTRACTION));
        };

        debug!("Submitting login form");
        let form = [
            ("csrfmiddlewaretoken", token.as_str()),
            ("auth-username", self.username.as_str()),
            ("auth-password", self.password.as_str()),
            LOGIN_STEP_FIELD,
        ];
        let request = self
            .session
            .http()
            .post(&url)
            .header(REFERER, &url)
            .form(&form);
        let response = self.session.send(request, Redirects::Follow).await?;
        let (status, body) = normalize::read(response).await?;

        if status != StatusCode::OK {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_LOGIN_FAILED));
        }
        if scrape::has_login_error(&body) {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_BAD_CREDENTIALS));
        }
        Ok(ApiResponse::ok_empty(status.as_u16()))
    }

    /// Logs the session out. The raw 302 is the sole success signal.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ApiResponse {
        let token = match self.fresh_csrf_token().await {
            Ok(token) => token,
            Err(response) => return response,
        };
        into_response(self.logout_inner(&token).await)
    }

    async fn logout_inner(&self, token: &str) -> Result<ApiResponse, ClientError> {
        let request = self
            .session
            .http()
            .post(self.create_url(LOGOUT_PATH))
            .header(REFERER, self.create_url("/"))
            .form(&[("csrfmiddlewaretoken", token)]);
        let response = self.session.send(request, Redirects::Stop).await?;
        let (status, _) = normalize::read(response).await?;
        Ok(expect_empty(status, &[StatusCode::FOUND], MSG_LOGOUT_FAILED))
    }

    /// Scrapes the expiry date of a free-tier webapp from the webapps page.
    ///
    /// On success `data.expiry_date` holds the date in ISO `YYYY-MM-DD`
    /// form.
    #[instrument(skip(self))]
    pub async fn get_app_expiry_date(&self, app_name: &str) -> ApiResponse {
        into_response(self.expiry_inner(app_name).await)
    }

    async fn expiry_inner(&self, app_name: &str) -> Result<ApiResponse, ClientError> {
        let (status, body) = self.get_page(&self.webapps_url()).await?;
        if status != StatusCode::OK {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_GET_APP_PAGE));
        }

        let text = match scrape::extract_app_expiry_text(&body, app_name) {
            Ok(text) => text,
            Err(e) => return Ok(ApiResponse::fail(status.as_u16(), e.to_string())),
        };
        let Ok(date) = dates::parse_expiry_date(&text) else {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_EXTRACTING));
        };
        Ok(ApiResponse::ok(
            status.as_u16(),
            json!({ "expiry_date": date.to_string() }),
        ))
    }

    async fn post_csrf_form(
        &self,
        url: String,
        referer: String,
        token: &str,
    ) -> Result<(StatusCode, String), ClientError> {
        let request = self
            .session
            .http()
            .post(url)
            .header(REFERER, referer)
            .form(&[("csrfmiddlewaretoken", token)]);
        let response = self.session.send(request, Redirects::Follow).await?;
        normalize::read(response).await
    }

    /// Reloads a webapp. Success requires HTTP 200 AND the exact body
    /// `"OK"`.
    #[instrument(skip(self))]
    pub async fn reload_app(&self, app_name: &str) -> ApiResponse {
        let token = match self.fresh_csrf_token().await {
            Ok(token) => token,
            Err(response) => return response,
        };
        into_response(self.reload_inner(app_name, &token).await)
    }

    async fn reload_inner(&self, app_name: &str, token: &str) -> Result<ApiResponse, ClientError> {
        let url = self.user_url(&format!("/webapps/{app_name}.pythonanywhere.com/reload"));
        let (status, body) = self.post_csrf_form(url, self.webapps_url(), token).await?;
        if status != StatusCode::OK || body != "OK" {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_RELOAD_FAILED));
        }
        Ok(ApiResponse::ok_empty(status.as_u16()))
    }

    /// Extends a free-tier webapp's expiry. Success is HTTP 200.
    #[instrument(skip(self))]
    pub async fn extend_app(&self, app_name: &str) -> ApiResponse {
        let token = match self.fresh_csrf_token().await {
            Ok(token) => token,
            Err(response) => return response,
        };
        into_response(self.extend_app_inner(app_name, &token).await)
    }

    async fn extend_app_inner(
        &self,
        app_name: &str,
        token: &str,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.user_url(&format!("/webapps/{app_name}.pythonanywhere.com/extend"));
        let (status, _) = self.post_csrf_form(url, self.webapps_url(), token).await?;
        Ok(expect_empty(
            status,
            &[StatusCode::OK],
            MSG_EXTEND_APP_FAILED,
        ))
    }

    /// Extends a scheduled task's expiry. Success requires HTTP 200 AND a
    /// JSON body with `status == "success"`.
    #[instrument(skip(self))]
    pub async fn extend_task(&self, task_id: u64) -> ApiResponse {
        let token = match self.fresh_csrf_token().await {
            Ok(token) => token,
            Err(response) => return response,
        };
        into_response(self.extend_task_inner(task_id, &token).await)
    }

    async fn extend_task_inner(
        &self,
        task_id: u64,
        token: &str,
    ) -> Result<ApiResponse, ClientError> {
        let url = self.user_url(&format!("/schedule/task/{task_id}/extend"));
        let (status, body) = self.post_csrf_form(url, self.tasks_tab_url(), token).await?;

        if status != StatusCode::OK {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_EXTEND_TASK_FAILED));
        }
        let outcome: Option<Value> = serde_json::from_str(&body).ok();
        let succeeded = outcome
            .as_ref()
            .and_then(|v| v.get("status"))
            .and_then(Value::as_str)
            == Some("success");
        if !succeeded {
            return Ok(ApiResponse::fail(status.as_u16(), MSG_EXTEND_TASK_FAILED));
        }
        Ok(ApiResponse::ok_empty(status.as_u16()))
    }

    /// Creates a scheduled task through the web session's task endpoint.
    ///
    /// The task is validated locally before anything is sent; on success
    /// `data` holds the server's JSON record including the assigned `id`.
    #[instrument(skip(self, task))]
    pub async fn create_task(&self, task: &Task) -> ApiResponse {
        if let Err(e) = task.validate() {
            return ApiResponse::from(&e);
        }
        let token = match self.fresh_csrf_token().await {
            Ok(token) => token,
            Err(response) => return response,
        };
        into_response(self.create_task_inner(task, &token).await)
    }

    async fn create_task_inner(
        &self,
        task: &Task,
        token: &str,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .session
            .http()
            .post(self.schedule_api_url(""))
            .header(REFERER, self.tasks_tab_url())
            .header(CSRF_HEADER, token)
            .form(task);
        let response = self.session.send(request, Redirects::Follow).await?;
        let (status, body) = normalize::read(response).await?;
        Ok(expect_json(
            status,
            &body,
            &[StatusCode::CREATED],
            MSG_CREATE_TASK_FAILED,
        ))
    }

    /// Deletes a scheduled task by its server-assigned id.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: u64) -> ApiResponse {
        let token = match self.fresh_csrf_token().await {
            Ok(token) => token,
            Err(response) => return response,
        };
        into_response(self.delete_task_inner(task_id, &token).await)
    }

    async fn delete_task_inner(
        &self,
        task_id: u64,
        token: &str,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .session
            .http()
            .delete(self.schedule_api_url(&format!("{task_id}/")))
            .header(REFERER, self.tasks_tab_url())
            .header(CSRF_HEADER, token);
        let response = self.session.send(request, Redirects::Follow).await?;
        let (status, _) = normalize::read(response).await?;
        Ok(expect_empty(
            status,
            &[StatusCode::NO_CONTENT],
            MSG_DELETE_TASK_FAILED,
        ))
    }

    /// Lists the account's scheduled tasks.
    #[instrument(skip(self))]
    pub async fn get_tasks(&self) -> ApiResponse {
        into_response(self.get_tasks_inner().await)
    }

    async fn get_tasks_inner(&self) -> Result<ApiResponse, ClientError> {
        let request = self
            .session
            .http()
            .get(self.schedule_api_url(""))
            .header(REFERER, self.tasks_tab_url());
        let response = self.session.send(request, Redirects::Follow).await?;
        let (status, body) = normalize::read(response).await?;
        Ok(expect_json(
            status,
            &body,
            &[StatusCode::OK],
            MSG_GET_TASKS_FAILED,
        ))
    }

    /// Checks whether the account may create scheduled tasks.
    #[instrument(skip(self))]
    pub async fn can_create_tasks(&self) -> ApiResponse {
        into_response(self.can_create_tasks_inner().await)
    }

    async fn can_create_tasks_inner(&self) -> Result<ApiResponse, ClientError> {
        let url = self.create_url(&format!(
            "/api/v0/user/{}/user_perms/schedule/",
            self.username
        ));
        let request = self
            .session
            .http()
            .get(url)
            .header(REFERER, self.tasks_tab_url());
        let response = self.session.send(request, Redirects::Follow).await?;
        let (status, body) = normalize::read(response).await?;
        Ok(expect_json(
            status,
            &body,
            &[StatusCode::OK],
            MSG_PERMS_FAILED,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WebClient {
        WebClient::new("sam", "hunter2").unwrap()
    }

    #[test]
    fn test_create_url() {
        let web = client();
        assert_eq!(web.create_url(""), BASE_URL);
        assert_eq!(
            web.create_url("/login/"),
            "https://www.pythonanywhere.com/login/"
        );
        assert_eq!(
            client().with_base_url("http://127.0.0.1:8080").create_url("/login/"),
            "http://127.0.0.1:8080/login/"
        );
    }

    #[test]
    fn test_user_scoped_urls() {
        let web = client();
        assert_eq!(
            web.webapps_url(),
            "https://www.pythonanywhere.com/user/sam/webapps/"
        );
        assert_eq!(
            web.schedule_api_url("42/"),
            "https://www.pythonanywhere.com/api/v0/user/sam/schedule/42/"
        );
        assert_eq!(
            web.user_url("/webapps/sam.pythonanywhere.com/reload"),
            "https://www.pythonanywhere.com/user/sam/webapps/sam.pythonanywhere.com/reload"
        );
    }

    #[test]
    fn test_cookie_export_import() {
        let web = client();
        web.load_cookies(std::collections::BTreeMap::from([(
            "csrftoken".to_string(),
            "abc".to_string(),
        )]));

        let other = client();
        other.load_cookies(web.cookies());
        assert_eq!(
            other.cookies().get("csrftoken").map(String::as_str),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn test_create_task_rejects_invalid_schedule_without_io() {
        let web = client();
        let task = Task::daily("echo 1", "d", 24, 0);

        // Validation fails before any request is built, so this completes
        // without touching the network.
        let response = web.create_task(&task).await;
        assert!(response.error);
        assert!(response.message().unwrap().contains("hour"));
    }

    #[tokio::test]
    async fn test_csrf_failure_propagates_verbatim() {
        // Port 9 (discard) is closed on any sane host, so the token fetch
        // fails at the transport and every CSRF-dependent operation must
        // hand that failure back unchanged.
        let web = client().with_base_url("http://127.0.0.1:9");

        let token_failure = web.get_csrf_token().await;
        assert!(token_failure.error);
        assert_eq!(token_failure.status_code, None);

        assert_eq!(web.reload_app("sam").await, token_failure);
        assert_eq!(web.extend_app("sam").await, token_failure);
        assert_eq!(web.extend_task(7).await, token_failure);
        assert_eq!(web.delete_task(7).await, token_failure);
        assert_eq!(web.logout().await, token_failure);
        assert_eq!(
            web.create_task(&Task::daily("echo 1", "d", 7, 0)).await,
            token_failure
        );
    }
}
