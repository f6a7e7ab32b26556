//! API client: token-authenticated REST calls against the versioned API.
//!
//! One method per resource/action pair. Every call builds a URL from the
//! region-selected base, sends `Authorization: Token <token>`, and maps the
//! outcome through the shared normalizer (JSON if the body parses, raw text
//! under a `text` key otherwise). Expected-success codes are
//! endpoint-specific: 201 for creations, 204 for deletions, 200 elsewhere.

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use tracing::instrument;

use pythonanywhere_core::{ApiResponse, ClientError, ConsoleSpec, Region, StaticHeader, StaticPath, Task};

use crate::normalize::{self, expect_body, expect_empty, expect_json};
use crate::session::{Redirects, Session, SessionConfig, TokenCredentials};

const OK: &[StatusCode] = &[StatusCode::OK];
const CREATED: &[StatusCode] = &[StatusCode::CREATED];
const NO_CONTENT: &[StatusCode] = &[StatusCode::NO_CONTENT];
/// File uploads answer 200 for an overwrite and 201 for a new file.
const OK_OR_CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];

/// Token-authenticated client for the platform's REST API.
#[derive(Debug)]
pub struct ApiClient {
    username: String,
    region: Region,
    session: Session,
}

impl ApiClient {
    /// Creates a client for the given account and region.
    pub fn new(
        username: impl Into<String>,
        token: impl Into<String>,
        region: Region,
    ) -> Result<Self, ClientError> {
        Self::with_config(username, token, region, &SessionConfig::default())
    }

    /// Creates a client with a caller-supplied user agent and timeout.
    pub fn with_config(
        username: impl Into<String>,
        token: impl Into<String>,
        region: Region,
        config: &SessionConfig,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            username: username.into(),
            region,
            session: Session::new(config, Box::new(TokenCredentials::new(token)))?,
        })
    }

    /// Creates a client from a region name, failing fast with
    /// [`ClientError::Configuration`] on anything but `"us"` or `"eu"`.
    pub fn from_region_str(
        username: impl Into<String>,
        token: impl Into<String>,
        region: &str,
    ) -> Result<Self, ClientError> {
        Self::new(username, token, region.parse()?)
    }

    /// The region this client targets.
    pub fn region(&self) -> Region {
        self.region
    }

    fn user_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/v0/user/{}{suffix}",
            self.region.base_url(),
            self.username
        )
    }

    fn webapp_url(&self, app_name: &str, suffix: &str) -> String {
        self.user_url(&format!("/webapps/{app_name}.pythonanywhere.com{suffix}"))
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<(StatusCode, String), ClientError> {
        let response = self.session.send(request, Redirects::Follow).await?;
        normalize::read(response).await
    }

    async fn send_expect(
        &self,
        request: RequestBuilder,
        expected: &[StatusCode],
        failure: &str,
    ) -> ApiResponse {
        match self.dispatch(request).await {
            Ok((status, body)) => expect_body(status, &body, expected, failure),
            Err(e) => ApiResponse::from(&e),
        }
    }

    async fn send_expect_json(
        &self,
        request: RequestBuilder,
        expected: &[StatusCode],
        failure: &str,
    ) -> ApiResponse {
        match self.dispatch(request).await {
            Ok((status, body)) => expect_json(status, &body, expected, failure),
            Err(e) => ApiResponse::from(&e),
        }
    }

    async fn send_expect_empty(
        &self,
        request: RequestBuilder,
        expected: &[StatusCode],
        failure: &str,
    ) -> ApiResponse {
        match self.dispatch(request).await {
            Ok((status, _)) => expect_empty(status, expected, failure),
            Err(e) => ApiResponse::from(&e),
        }
    }

    // ------------------------------------------------------------------
    // Consoles
    // ------------------------------------------------------------------

    /// Creates a console. `data` holds the server record with its `id`.
    #[instrument(skip(self, spec))]
    pub async fn create_console(&self, spec: &ConsoleSpec) -> ApiResponse {
        let request = self
            .session
            .http()
            .post(self.user_url("/consoles/"))
            .form(spec);
        self.send_expect(request, CREATED, "Create console failed").await
    }

    /// Lists the account's consoles.
    #[instrument(skip(self))]
    pub async fn list_consoles(&self) -> ApiResponse {
        let request = self.session.http().get(self.user_url("/consoles/"));
        self.send_expect_json(request, OK, "List consoles failed").await
    }

    /// Kills and removes a console.
    #[instrument(skip(self))]
    pub async fn delete_console(&self, console_id: u64) -> ApiResponse {
        let request = self
            .session
            .http()
            .delete(self.user_url(&format!("/consoles/{console_id}/")));
        self.send_expect_empty(request, NO_CONTENT, "Delete console failed").await
    }

    /// Types a string into a running console. Include a trailing newline to
    /// execute it.
    #[instrument(skip(self, input))]
    pub async fn console_input(&self, console_id: u64, input: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .post(self.user_url(&format!("/consoles/{console_id}/send_input/")))
            .form(&[("input", input)]);
        self.send_expect(request, OK, "Console input failed").await
    }

    /// Reads the most recent output of a running console; `data.output`
    /// holds the buffer.
    #[instrument(skip(self))]
    pub async fn console_latest_output(&self, console_id: u64) -> ApiResponse {
        let request = self
            .session
            .http()
            .get(self.user_url(&format!("/consoles/{console_id}/get_latest_output/")));
        self.send_expect(request, OK, "Console output failed").await
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Downloads a file. Non-JSON bodies (the normal case) land under
    /// `data.text`.
    #[instrument(skip(self))]
    pub async fn get_file(&self, path: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .get(self.user_url(&format!("/files/path{path}")));
        self.send_expect(request, OK, "Get file failed").await
    }

    /// Uploads a file, creating or overwriting it at `path`.
    #[instrument(skip(self, content))]
    pub async fn create_file(&self, path: &str, content: Vec<u8>) -> ApiResponse {
        let file_name = path.rsplit('/').next().unwrap_or("file").to_string();
        let form = Form::new().part("content", Part::bytes(content).file_name(file_name));
        let request = self
            .session
            .http()
            .post(self.user_url(&format!("/files/path{path}")))
            .multipart(form);
        self.send_expect(request, OK_OR_CREATED, "Create file failed").await
    }

    /// Deletes a file (or an empty directory).
    #[instrument(skip(self))]
    pub async fn delete_file(&self, path: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .delete(self.user_url(&format!("/files/path{path}")));
        self.send_expect_empty(request, NO_CONTENT, "Delete file failed").await
    }

    // ------------------------------------------------------------------
    // Scheduled tasks
    // ------------------------------------------------------------------

    /// Creates a scheduled task; validated locally before submission.
    #[instrument(skip(self, task))]
    pub async fn create_task(&self, task: &Task) -> ApiResponse {
        if let Err(e) = task.validate() {
            return ApiResponse::from(&e);
        }
        let request = self
            .session
            .http()
            .post(self.user_url("/schedule/"))
            .form(task);
        self.send_expect_json(request, CREATED, "Create task failed").await
    }

    /// Lists the account's scheduled tasks.
    #[instrument(skip(self))]
    pub async fn get_tasks(&self) -> ApiResponse {
        let request = self.session.http().get(self.user_url("/schedule/"));
        self.send_expect_json(request, OK, "Get tasks failed").await
    }

    /// Deletes a scheduled task by id.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, task_id: u64) -> ApiResponse {
        let request = self
            .session
            .http()
            .delete(self.user_url(&format!("/schedule/{task_id}/")));
        self.send_expect_empty(request, NO_CONTENT, "Delete task failed").await
    }

    /// Checks whether the account may create scheduled tasks.
    #[instrument(skip(self))]
    pub async fn can_create_tasks(&self) -> ApiResponse {
        let request = self
            .session
            .http()
            .get(self.user_url("/user_perms/schedule/"));
        self.send_expect_json(request, OK, "Permissions check failed").await
    }

    // ------------------------------------------------------------------
    // Web apps
    // ------------------------------------------------------------------

    /// Reloads a webapp so code and configuration changes take effect.
    #[instrument(skip(self))]
    pub async fn reload_app(&self, app_name: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .post(self.webapp_url(app_name, "/reload/"));
        self.send_expect(request, OK, "Reload app failed").await
    }

    /// Enables a previously disabled webapp.
    #[instrument(skip(self))]
    pub async fn enable_app(&self, app_name: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .post(self.webapp_url(app_name, "/enable/"));
        self.send_expect(request, OK, "Enable app failed").await
    }

    /// Disables a webapp; requests to it will fail until re-enabled.
    #[instrument(skip(self))]
    pub async fn disable_app(&self, app_name: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .post(self.webapp_url(app_name, "/disable/"));
        self.send_expect(request, OK, "Disable app failed").await
    }

    // ------------------------------------------------------------------
    // Static headers
    // ------------------------------------------------------------------

    /// Lists a webapp's static headers.
    #[instrument(skip(self))]
    pub async fn list_static_headers(&self, app_name: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .get(self.webapp_url(app_name, "/static_headers/"));
        self.send_expect_json(request, OK, "List static headers failed").await
    }

    /// Adds a static header to a webapp.
    #[instrument(skip(self, header))]
    pub async fn create_static_header(
        &self,
        app_name: &str,
        header: &StaticHeader,
    ) -> ApiResponse {
        let request = self
            .session
            .http()
            .post(self.webapp_url(app_name, "/static_headers/"))
            .form(header);
        self.send_expect(request, CREATED, "Create static header failed").await
    }

    /// Fetches one static header by id.
    #[instrument(skip(self))]
    pub async fn get_static_header(&self, app_name: &str, header_id: u64) -> ApiResponse {
        let request = self
            .session
            .http()
            .get(self.webapp_url(app_name, &format!("/static_headers/{header_id}/")));
        self.send_expect_json(request, OK, "Get static header failed").await
    }

    /// Removes a static header by id.
    #[instrument(skip(self))]
    pub async fn delete_static_header(&self, app_name: &str, header_id: u64) -> ApiResponse {
        let request = self
            .session
            .http()
            .delete(self.webapp_url(app_name, &format!("/static_headers/{header_id}/")));
        self.send_expect_empty(request, NO_CONTENT, "Delete static header failed").await
    }

    // ------------------------------------------------------------------
    // Static paths
    // ------------------------------------------------------------------

    /// Lists a webapp's static path mappings.
    #[instrument(skip(self))]
    pub async fn list_static_paths(&self, app_name: &str) -> ApiResponse {
        let request = self
            .session
            .http()
            .get(self.webapp_url(app_name, "/static_files/"));
        self.send_expect_json(request, OK, "List static paths failed").await
    }

    /// Adds a static path mapping to a webapp.
    #[instrument(skip(self, static_path))]
    pub async fn create_static_path(
        &self,
        app_name: &str,
        static_path: &StaticPath,
    ) -> ApiResponse {
        let request = self
            .session
            .http()
            .post(self.webapp_url(app_name, "/static_files/"))
            .form(static_path);
        self.send_expect(request, CREATED, "Create static path failed").await
    }

    /// Fetches one static path mapping by id.
    #[instrument(skip(self))]
    pub async fn get_static_path(&self, app_name: &str, path_id: u64) -> ApiResponse {
        let request = self
            .session
            .http()
            .get(self.webapp_url(app_name, &format!("/static_files/{path_id}/")));
        self.send_expect_json(request, OK, "Get static path failed").await
    }

    /// Removes a static path mapping by id.
    #[instrument(skip(self))]
    pub async fn delete_static_path(&self, app_name: &str, path_id: u64) -> ApiResponse {
        let request = self
            .session
            .http()
            .delete(self.webapp_url(app_name, &format!("/static_files/{path_id}/")));
        self.send_expect_empty(request, NO_CONTENT, "Delete static path failed").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new("sam", "token123", Region::Us).unwrap()
    }

    #[test]
    fn test_user_urls_follow_region() {
        let api = client();
        assert_eq!(
            api.user_url("/consoles/"),
            "https://www.pythonanywhere.com/api/v0/user/sam/consoles/"
        );

        let api_eu = ApiClient::new("sam", "token123", Region::Eu).unwrap();
        assert_eq!(
            api_eu.user_url("/schedule/"),
            "https://eu.pythonanywhere.com/api/v0/user/sam/schedule/"
        );
    }

    #[test]
    fn test_webapp_url_appends_platform_domain() {
        let api = client();
        assert_eq!(
            api.webapp_url("sam", "/static_headers/3/"),
            "https://www.pythonanywhere.com/api/v0/user/sam/webapps/sam.pythonanywhere.com/static_headers/3/"
        );
    }

    #[test]
    fn test_file_path_urls_keep_leading_slash() {
        let api = client();
        assert_eq!(
            api.user_url("/files/path/home/sam/notes.txt"),
            "https://www.pythonanywhere.com/api/v0/user/sam/files/path/home/sam/notes.txt"
        );
    }

    #[test]
    fn test_unknown_region_fails_at_construction() {
        let err = ApiClient::from_region_str("sam", "token123", "mars").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_create_task_rejects_invalid_schedule_without_io() {
        let api = client();
        let task = Task::daily("echo 1", "d", 7, 60);

        let response = api.create_task(&task).await;
        assert!(response.error);
        assert!(response.message().unwrap().contains("minute"));
    }
}
