use log::{debug, info};

use crate::error::{InspectorError, Result};
use crate::inspect::{process_log, PipelineFilter, ProcessedLog};
use crate::model::{Pipeline, Project, Status};
use crate::providers::GitLabProvider;
use crate::snapshot::Snapshot;

/// Where pipeline data comes from for one invocation.
pub enum DataSource {
    Snapshot(Snapshot),
    GitLab {
        provider: GitLabProvider,
        /// Upper bound on pipelines fetched per request
        limit: usize,
    },
}

/// The part of a [`PipelineFilter`] GitLab can evaluate server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RemoteQuery {
    limit: usize,
    status: Option<Status>,
}

impl RemoteQuery {
    fn new(filter: &PipelineFilter, configured_limit: usize) -> Self {
        // GitLab's `pending` excludes created, manual, scheduled and the other
        // states folded into it here, so it is matched locally.
        let status = filter.status.filter(|s| *s != Status::Pending);

        let local_only = filter.project_id.is_some()
            || filter.search.as_deref().is_some_and(|s| !s.is_empty())
            || status != filter.status;

        // Criteria evaluated locally may discard fetched pipelines, so the
        // requested limit only bounds the request when nothing else filters.
        let limit = match filter.limit {
            Some(requested) if !local_only => requested.min(configured_limit),
            _ => configured_limit,
        };

        Self { limit, status }
    }
}

impl DataSource {
    /// Pipelines matching `filter`, newest first.
    ///
    /// Branch and status are pushed down to the API where GitLab has the same
    /// meaning for them; the full filter, including `limit`, is then applied
    /// locally.
    pub async fn pipelines(&self, filter: &PipelineFilter, with_jobs: bool) -> Result<Vec<Pipeline>> {
        let pipelines = match self {
            Self::Snapshot(snapshot) => snapshot.pipelines.clone(),
            Self::GitLab { provider, limit } => {
                let query = RemoteQuery::new(filter, *limit);
                debug!("Querying GitLab with {query:?}");
                provider
                    .fetch_pipelines(query.limit, filter.branch.as_deref(), query.status, with_jobs)
                    .await?
            }
        };

        Ok(filter.apply(&pipelines).into_iter().cloned().collect())
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        match self {
            Self::Snapshot(snapshot) => Ok(snapshot.projects()),
            Self::GitLab { provider, .. } => provider.fetch_projects().await,
        }
    }

    /// Artifacts archive of a job. Snapshots carry no artifact contents.
    pub async fn artifacts(&self, job_id: u64) -> Result<Vec<u8>> {
        match self {
            Self::Snapshot(_) => Err(InspectorError::Unsupported(
                "artifact downloads need a GitLab project".to_string(),
            )),
            Self::GitLab { provider, .. } => provider.download_artifacts(job_id).await,
        }
    }

    pub async fn pipeline(&self, pipeline_id: u64) -> Result<Pipeline> {
        match self {
            Self::Snapshot(snapshot) => snapshot
                .pipelines
                .iter()
                .find(|p| p.id == pipeline_id)
                .cloned()
                .ok_or_else(|| InspectorError::NotFound(format!("pipeline {pipeline_id}"))),
            Self::GitLab { provider, .. } => provider.fetch_pipeline(pipeline_id).await,
        }
    }

    /// Stage order from CI configuration, if any is known for the pipeline.
    pub async fn ci_stages(&self, pipeline: &Pipeline) -> Option<Vec<String>> {
        match self {
            Self::Snapshot(snapshot) => snapshot.ci_stages.get(&pipeline.project_id).cloned(),
            Self::GitLab { provider, .. } => provider.fetch_ci_stages(pipeline).await,
        }
    }

    pub async fn job_log(&self, pipeline_id: u64, job_id: u64) -> Result<ProcessedLog> {
        let pipeline = self.pipeline(pipeline_id).await?;
        if !pipeline.jobs.iter().any(|job| job.id == job_id) {
            return Err(InspectorError::NotFound(format!(
                "job {job_id} in pipeline {pipeline_id}"
            )));
        }

        let raw_log = match self {
            Self::Snapshot(snapshot) => snapshot
                .job_logs
                .get(&job_id)
                .cloned()
                .ok_or_else(|| InspectorError::NotFound(format!("log for job {job_id}")))?,
            Self::GitLab { provider, .. } => provider.fetch_job_log(job_id).await?,
        };

        info!("Processing log for job {job_id} ({} bytes)", raw_log.len());
        Ok(process_log(raw_log, job_id, pipeline_id))
    }
}
