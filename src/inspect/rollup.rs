use serde::Serialize;

use super::stages::group_by_stage;
use crate::model::{Job, Status};

/// Per-stage view used by the pipeline detail output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub status: Option<Status>,
    pub jobs: usize,
    /// Longest job in the stage, since jobs of one stage run in parallel
    pub duration: Option<f64>,
}

/// Combines job statuses into a single status.
///
/// Precedence: running, pending, failed, canceled. A set made only of skipped
/// jobs is skipped; anything else is success. Returns `None` for no jobs.
pub fn rollup_status<I>(statuses: I) -> Option<Status>
where
    I: IntoIterator<Item = Status>,
{
    let mut seen = Vec::new();
    for status in statuses {
        if !seen.contains(&status) {
            seen.push(status);
        }
    }

    if seen.is_empty() {
        return None;
    }

    let rolled = [
        Status::Running,
        Status::Pending,
        Status::Failed,
        Status::Canceled,
    ]
    .into_iter()
    .find(|status| seen.contains(status))
    .unwrap_or(if seen == [Status::Skipped] {
        Status::Skipped
    } else {
        Status::Success
    });

    Some(rolled)
}

/// Rollup over every job of a pipeline.
pub fn pipeline_rollup(jobs: &[Job]) -> Option<Status> {
    rollup_status(jobs.iter().map(|job| job.status))
}

pub fn stage_summaries(jobs: &[Job], ordered_stages: &[String]) -> Vec<StageSummary> {
    group_by_stage(jobs, ordered_stages)
        .into_iter()
        .map(|(name, stage_jobs)| StageSummary {
            status: rollup_status(stage_jobs.iter().map(|job| job.status)),
            jobs: stage_jobs.len(),
            duration: stage_jobs
                .iter()
                .filter_map(|job| job.duration)
                .reduce(f64::max),
            name,
        })
        .collect()
}
