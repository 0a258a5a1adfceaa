use log::{debug, info};

use super::{GitLabClient, PAGE_SIZE};
use crate::error::{InspectorError, Result};
use crate::model::{Job, Pipeline, Status};

impl GitLabClient {
    /// Lists the most recent pipelines of a project, newest first.
    pub async fn fetch_pipelines(
        &self,
        project: &str,
        limit: usize,
        ref_: Option<&str>,
        status: Option<Status>,
    ) -> Result<Vec<Pipeline>> {
        let mut all_pipelines: Vec<Pipeline> = Vec::new();
        let mut page = 1;

        while all_pipelines.len() < limit {
            let per_page = (limit - all_pipelines.len()).min(PAGE_SIZE);

            let mut url = self.project_url(project, &["pipelines"])?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("per_page", &per_page.to_string())
                    .append_pair("page", &page.to_string())
                    .append_pair("order_by", "id")
                    .append_pair("sort", "desc");
                if let Some(ref_) = ref_ {
                    query.append_pair("ref", ref_);
                }
                if let Some(status) = status {
                    query.append_pair("status", status.as_str());
                }
            }

            let batch: Vec<Pipeline> = self.get_json(url).await?;
            let fetched = batch.len();
            debug!("Fetched page {page} with {fetched} pipelines");
            all_pipelines.extend(batch);

            if fetched < per_page {
                break;
            }
            page += 1;
        }

        all_pipelines.truncate(limit);
        info!("Fetched {} pipelines for {project}", all_pipelines.len());
        Ok(all_pipelines)
    }

    /// Fetches one pipeline, including its duration. Jobs are not included.
    pub async fn fetch_pipeline(&self, project: &str, pipeline_id: u64) -> Result<Pipeline> {
        let url = self.project_url(project, &["pipelines", &pipeline_id.to_string()])?;
        self.get_json(url).await.map_err(|e| match e {
            InspectorError::ApiError { status: 404, .. } => {
                InspectorError::NotFound(format!("pipeline {pipeline_id}"))
            }
            other => other,
        })
    }

    /// All jobs of a pipeline, following pagination.
    pub async fn fetch_pipeline_jobs(&self, project: &str, pipeline_id: u64) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = Vec::new();
        let mut page = 1;

        loop {
            let mut url =
                self.project_url(project, &["pipelines", &pipeline_id.to_string(), "jobs"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<Job> = self.get_json(url).await?;
            let fetched = batch.len();
            jobs.extend(batch);

            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        // The API lists jobs newest first; stage grouping wants creation order
        jobs.sort_by_key(|job| job.id);
        Ok(jobs)
    }

    /// Raw trace (log) of a job.
    pub async fn fetch_job_trace(&self, project: &str, job_id: u64) -> Result<String> {
        let url = self.project_url(project, &["jobs", &job_id.to_string(), "trace"])?;
        let response = self.get(url).await.map_err(|e| match e {
            InspectorError::ApiError { status: 404, .. } => {
                InspectorError::NotFound(format!("log for job {job_id}"))
            }
            other => other,
        })?;
        Ok(response.text().await?)
    }

    /// Raw `.gitlab-ci.yml` at `ref_`, or `None` when the project has none.
    pub async fn fetch_ci_config(&self, project: &str, ref_: &str) -> Result<Option<String>> {
        let mut url = self.project_url(
            project,
            &["repository", "files", ".gitlab-ci.yml", "raw"],
        )?;
        url.query_pairs_mut().append_pair("ref", ref_);

        match self.get(url).await {
            Ok(response) => Ok(Some(response.text().await?)),
            Err(InspectorError::ApiError { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
