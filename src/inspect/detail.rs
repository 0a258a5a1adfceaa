use indexmap::IndexMap;
use serde::Serialize;

use super::rollup::{pipeline_rollup, stage_summaries, StageSummary};
use super::stages::{group_by_stage, order_stages_with, StageOrderOptions};
use crate::model::{Job, Pipeline, Status};

/// Where the displayed stage order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOrderSource {
    CiConfig,
    Default,
}

/// Everything the pipeline detail screen shows, computed from one snapshot.
#[derive(Debug, Serialize)]
pub struct PipelineView<'a> {
    pub pipeline: &'a Pipeline,
    /// Rollup over the pipeline's jobs
    pub job_status: Option<Status>,
    pub stage_order: StageOrderSource,
    pub stages: Vec<StageSummary>,
    pub jobs_by_stage: IndexMap<String, Vec<&'a Job>>,
}

impl<'a> PipelineView<'a> {
    pub fn build(
        pipeline: &'a Pipeline,
        ci_stages: Option<&[String]>,
        options: StageOrderOptions,
    ) -> Self {
        let ci_stages = ci_stages.filter(|stages| !stages.is_empty());
        let ordered = order_stages_with(&pipeline.jobs, ci_stages, options);

        Self {
            pipeline,
            job_status: pipeline_rollup(&pipeline.jobs),
            stage_order: if ci_stages.is_some() {
                StageOrderSource::CiConfig
            } else {
                StageOrderSource::Default
            },
            stages: stage_summaries(&pipeline.jobs, &ordered),
            jobs_by_stage: group_by_stage(&pipeline.jobs, &ordered),
        }
    }
}
