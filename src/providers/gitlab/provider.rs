use log::{info, warn};

use crate::auth::Token;
use crate::error::Result;
use crate::model::{Pipeline, Project, Status};

use super::ci_config::parse_stages;
use super::client::GitLabClient;

/// Loads pipeline snapshots for one GitLab project.
pub struct GitLabProvider {
    pub client: GitLabClient,
    pub project: String,
}

impl GitLabProvider {
    /// Creates a provider for `project`, a numeric id or a "group/project" path.
    pub fn new(base_url: &str, project: String, token: Option<Token>) -> Result<Self> {
        let client = GitLabClient::new(base_url, token)?;

        Ok(Self { client, project })
    }

    /// Recent pipelines, optionally with their jobs.
    ///
    /// Job lists are fetched concurrently, one request chain per pipeline.
    pub async fn fetch_pipelines(
        &self,
        limit: usize,
        ref_: Option<&str>,
        status: Option<Status>,
        with_jobs: bool,
    ) -> Result<Vec<Pipeline>> {
        let mut pipelines = self
            .client
            .fetch_pipelines(&self.project, limit, ref_, status)
            .await?;

        for pipeline in &mut pipelines {
            pipeline.project_name.get_or_insert_with(|| self.project.clone());
        }

        if !with_jobs {
            return Ok(pipelines);
        }

        info!("Fetching jobs for {} pipelines in parallel...", pipelines.len());

        let futures: Vec<_> = pipelines
            .iter()
            .map(|p| self.client.fetch_pipeline_jobs(&self.project, p.id))
            .collect();

        let job_lists = futures::future::join_all(futures)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        for (pipeline, jobs) in pipelines.iter_mut().zip(job_lists) {
            pipeline.jobs = jobs;
        }

        Ok(pipelines)
    }

    /// One pipeline with its jobs.
    pub async fn fetch_pipeline(&self, pipeline_id: u64) -> Result<Pipeline> {
        let (pipeline, jobs) = tokio::try_join!(
            self.client.fetch_pipeline(&self.project, pipeline_id),
            self.client.fetch_pipeline_jobs(&self.project, pipeline_id),
        )?;

        let mut pipeline = pipeline;
        pipeline.project_name.get_or_insert_with(|| self.project.clone());
        pipeline.jobs = jobs;
        Ok(pipeline)
    }

    /// Stage order declared in the pipeline's `.gitlab-ci.yml`.
    ///
    /// Any failure is logged and reported as `None`, so callers fall back to
    /// the standard stage order.
    pub async fn fetch_ci_stages(&self, pipeline: &Pipeline) -> Option<Vec<String>> {
        let ref_ = if pipeline.sha.is_empty() {
            pipeline.ref_.as_str()
        } else {
            pipeline.sha.as_str()
        };

        match self.client.fetch_ci_config(&self.project, ref_).await {
            Ok(Some(yaml)) => parse_stages(&yaml),
            Ok(None) => {
                info!("No .gitlab-ci.yml at {ref_}, using default stage order");
                None
            }
            Err(e) => {
                warn!("Could not fetch CI config, using default stage order: {e}");
                None
            }
        }
    }

    pub async fn fetch_job_log(&self, job_id: u64) -> Result<String> {
        self.client.fetch_job_trace(&self.project, job_id).await
    }

    /// Projects visible to the configured token, not only `self.project`.
    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.client.fetch_projects().await
    }

    pub async fn download_artifacts(&self, job_id: u64) -> Result<Vec<u8>> {
        self.client.download_artifacts(&self.project, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    use crate::error::InspectorError;

    const PIPELINES_JSON: &str = r#"[
        {"id": 12, "project_id": 42, "ref": "main", "sha": "a1b2", "status": "success"},
        {"id": 11, "project_id": 42, "ref": "feature/login", "sha": "c3d4", "status": "failed",
         "project_name": "backend-api"}
    ]"#;

    fn provider(server: &Server) -> GitLabProvider {
        let client = GitLabClient::new(&server.url(), None)
            .unwrap()
            .with_retry_delay(Duration::ZERO);
        GitLabProvider {
            client,
            project: "42".to_string(),
        }
    }

    fn pipeline(sha: &str) -> Pipeline {
        serde_json::from_value(serde_json::json!({
            "id": 12, "project_id": 42, "ref": "main", "sha": sha, "status": "success"
        }))
        .unwrap()
    }

    async fn mock_ci_file(server: &mut Server, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/api/v4/projects/42/repository/files/.gitlab-ci.yml/raw")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    mod fetch_pipelines {
        use super::*;

        #[tokio::test]
        async fn attaches_jobs_to_each_pipeline() {
            let mut server = Server::new_async().await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(PIPELINES_JSON)
                .create_async()
                .await;
            let jobs_12 = server
                .mock("GET", "/api/v4/projects/42/pipelines/12/jobs")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(r#"[{"id": 120, "name": "compile", "stage": "build", "status": "success"}]"#)
                .create_async()
                .await;
            let jobs_11 = server
                .mock("GET", "/api/v4/projects/42/pipelines/11/jobs")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(
                    r#"[{"id": 111, "name": "rspec", "stage": "test", "status": "failed"},
                        {"id": 110, "name": "compile", "stage": "build", "status": "success"}]"#,
                )
                .create_async()
                .await;

            let pipelines = provider(&server)
                .fetch_pipelines(10, None, None, true)
                .await
                .unwrap();

            jobs_12.assert_async().await;
            jobs_11.assert_async().await;
            assert_eq!(pipelines.len(), 2);
            assert_eq!(pipelines[0].jobs.len(), 1, "Jobs must land on their own pipeline");
            assert_eq!(pipelines[1].jobs.len(), 2);
            assert_eq!(pipelines[1].jobs[0].name, "compile", "Jobs are in creation order");
        }

        #[tokio::test]
        async fn skips_job_requests_when_not_asked() {
            let mut server = Server::new_async().await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(PIPELINES_JSON)
                .create_async()
                .await;
            let jobs = server
                .mock("GET", Matcher::Regex(r"^/api/v4/projects/42/pipelines/\d+/jobs$".into()))
                .match_query(Matcher::Any)
                .expect(0)
                .create_async()
                .await;

            let pipelines = provider(&server)
                .fetch_pipelines(10, None, None, false)
                .await
                .unwrap();

            jobs.assert_async().await;
            assert!(pipelines.iter().all(|p| p.jobs.is_empty()));
            assert_eq!(pipelines[0].project_name.as_deref(), Some("42"));
            assert_eq!(pipelines[1].project_name.as_deref(), Some("backend-api"));
        }

        #[tokio::test]
        async fn job_failure_fails_the_whole_fetch() {
            let mut server = Server::new_async().await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(PIPELINES_JSON)
                .create_async()
                .await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines/12/jobs")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body("[]")
                .create_async()
                .await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines/11/jobs")
                .match_query(Matcher::Any)
                .with_status(403)
                .create_async()
                .await;

            let result = provider(&server).fetch_pipelines(10, None, None, true).await;

            assert!(matches!(result, Err(InspectorError::ApiError { status: 403, .. })));
        }
    }

    mod fetch_pipeline {
        use super::*;

        #[tokio::test]
        async fn joins_pipeline_and_jobs() {
            let mut server = Server::new_async().await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines/12")
                .with_status(200)
                .with_body(r#"{"id": 12, "project_id": 42, "ref": "main", "status": "failed", "duration": 95.0}"#)
                .create_async()
                .await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines/12/jobs")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(r#"[{"id": 121, "name": "rspec", "stage": "test", "status": "failed"}]"#)
                .create_async()
                .await;

            let pipeline = provider(&server).fetch_pipeline(12).await.unwrap();

            assert_eq!(pipeline.duration, Some(95.0));
            assert_eq!(pipeline.jobs.len(), 1);
            assert_eq!(pipeline.project_name.as_deref(), Some("42"));
        }

        #[tokio::test]
        async fn missing_pipeline_is_not_found_even_if_jobs_load() {
            let mut server = Server::new_async().await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines/99")
                .with_status(404)
                .create_async()
                .await;
            server
                .mock("GET", "/api/v4/projects/42/pipelines/99/jobs")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body("[]")
                .create_async()
                .await;

            let result = provider(&server).fetch_pipeline(99).await;

            assert!(matches!(result, Err(InspectorError::NotFound(_))));
        }
    }

    mod fetch_ci_stages {
        use super::*;

        #[tokio::test]
        async fn reads_stages_at_the_pipeline_commit() {
            let mut server = Server::new_async().await;
            let mock = server
                .mock("GET", "/api/v4/projects/42/repository/files/.gitlab-ci.yml/raw")
                .match_query(Matcher::UrlEncoded("ref".into(), "a1b2".into()))
                .with_status(200)
                .with_body("stages:\n  - lint\n  - build\n")
                .create_async()
                .await;

            let stages = provider(&server).fetch_ci_stages(&pipeline("a1b2")).await;

            mock.assert_async().await;
            assert_eq!(stages, Some(vec!["lint".to_string(), "build".to_string()]));
        }

        #[tokio::test]
        async fn falls_back_to_ref_without_sha() {
            let mut server = Server::new_async().await;
            let mock = server
                .mock("GET", "/api/v4/projects/42/repository/files/.gitlab-ci.yml/raw")
                .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
                .with_status(200)
                .with_body("stages: [build]\n")
                .create_async()
                .await;

            let stages = provider(&server).fetch_ci_stages(&pipeline("")).await;

            mock.assert_async().await;
            assert_eq!(stages, Some(vec!["build".to_string()]));
        }

        #[tokio::test]
        async fn server_error_after_retries_is_none() {
            let mut server = Server::new_async().await;
            let mock = server
                .mock("GET", "/api/v4/projects/42/repository/files/.gitlab-ci.yml/raw")
                .match_query(Matcher::Any)
                .with_status(500)
                .expect(4)
                .create_async()
                .await;

            let stages = provider(&server).fetch_ci_stages(&pipeline("a1b2")).await;

            mock.assert_async().await;
            assert_eq!(stages, None, "Server errors fall back to the default order");
        }

        #[tokio::test]
        async fn forbidden_is_none() {
            let mut server = Server::new_async().await;
            mock_ci_file(&mut server, 403, "403 Forbidden").await;

            let stages = provider(&server).fetch_ci_stages(&pipeline("a1b2")).await;

            assert_eq!(stages, None);
        }

        #[tokio::test]
        async fn missing_file_is_none() {
            let mut server = Server::new_async().await;
            mock_ci_file(&mut server, 404, "").await;

            let stages = provider(&server).fetch_ci_stages(&pipeline("a1b2")).await;

            assert_eq!(stages, None);
        }

        #[tokio::test]
        async fn unparsable_file_is_none() {
            let mut server = Server::new_async().await;
            mock_ci_file(&mut server, 200, "stages: [unclosed").await;

            let stages = provider(&server).fetch_ci_stages(&pipeline("a1b2")).await;

            assert_eq!(stages, None);
        }
    }
}
