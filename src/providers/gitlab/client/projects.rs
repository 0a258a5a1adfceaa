use log::{debug, info};

use super::{GitLabClient, PAGE_SIZE};
use crate::error::{InspectorError, Result};
use crate::model::Project;

impl GitLabClient {
    /// Projects the token's user is a member of, following pagination.
    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = Vec::new();
        let mut page = 1;

        loop {
            let mut url = self.api_endpoint(&["projects"])?;
            url.query_pairs_mut()
                .append_pair("membership", "true")
                .append_pair("order_by", "last_activity_at")
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<Project> = self.get_json(url).await?;
            let fetched = batch.len();
            debug!("Fetched page {page} with {fetched} projects");
            projects.extend(batch);

            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        info!("Fetched {} projects", projects.len());
        Ok(projects)
    }

    /// Artifacts archive of a job as raw bytes.
    pub async fn download_artifacts(&self, project: &str, job_id: u64) -> Result<Vec<u8>> {
        let url = self.project_url(project, &["jobs", &job_id.to_string(), "artifacts"])?;
        let response = self.get(url).await.map_err(|e| match e {
            InspectorError::ApiError { status: 404, .. } => {
                InspectorError::NotFound(format!("artifacts for job {job_id}"))
            }
            other => other,
        })?;
        let bytes = response.bytes().await?;
        info!("Downloaded {} bytes of artifacts for job {job_id}", bytes.len());
        Ok(bytes.to_vec())
    }
}
