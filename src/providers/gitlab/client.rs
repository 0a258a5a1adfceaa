mod pipelines;
mod projects;
mod request;

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::auth::Token;
use crate::error::{InspectorError, Result};

const MAX_CONCURRENT_REQUESTS: usize = 16;
const RETRY_DELAY_SECONDS: u64 = 2;
/// GitLab caps `per_page` at 100.
const PAGE_SIZE: usize = 100;

/// Thin client over the GitLab REST v4 API.
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
    semaphore: Arc<Semaphore>,
    retry_delay: Duration,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("build-inspector/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InspectorError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut api_url = Url::parse(base_url)
            .map_err(|e| InspectorError::Config(format!("Invalid base URL: {e}")))?;

        api_url
            .path_segments_mut()
            .map_err(|()| InspectorError::Config(format!("Base URL cannot be a base: {base_url}")))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        Ok(Self {
            client,
            api_url,
            token,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
            retry_delay: Duration::from_secs(RETRY_DELAY_SECONDS),
        })
    }

    /// Wait between retries of a failed request.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.header("PRIVATE-TOKEN", token.as_str())
        } else {
            request
        }
    }

    /// URL below the API root, e.g. `projects`.
    fn api_endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| InspectorError::Config(format!("Invalid API URL: {}", self.api_url)))?
            .extend(segments);
        Ok(url)
    }

    /// URL below `projects/:id/`, with the project path percent-encoded as one segment.
    fn project_url(&self, project: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| InspectorError::Config(format!("Invalid API URL: {}", self.api_url)))?
            .push("projects")
            .push(project)
            .extend(segments);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_url_encodes_namespaced_paths() {
        let client = GitLabClient::new("https://gitlab.example.com", None).unwrap();
        let url = client.project_url("group/app", &["pipelines"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/group%2Fapp/pipelines"
        );
    }

    #[test]
    fn base_url_with_trailing_slash_and_prefix() {
        let client = GitLabClient::new("https://example.com/gitlab/", None).unwrap();
        let url = client.project_url("42", &["jobs", "7", "trace"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/gitlab/api/v4/projects/42/jobs/7/trace");
    }

    #[test]
    fn api_endpoint_below_api_root() {
        let client = GitLabClient::new("https://gitlab.example.com", None).unwrap();
        let url = client.api_endpoint(&["projects"]).unwrap();
        assert_eq!(url.as_str(), "https://gitlab.example.com/api/v4/projects");
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = GitLabClient::new("not a url", None);
        assert!(matches!(result, Err(InspectorError::Config(_))));
    }
}
