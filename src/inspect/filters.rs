use std::collections::BTreeSet;

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::model::{Pipeline, Status};

/// Criteria for narrowing down a pipeline list.
#[derive(Debug, Clone, Default)]
pub struct PipelineFilter {
    pub project_id: Option<u64>,
    /// Exact ref match
    pub branch: Option<String>,
    pub status: Option<Status>,
    /// Case-insensitive match against project name, ref, sha and id
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl PipelineFilter {
    pub fn matches(&self, pipeline: &Pipeline) -> bool {
        if self.project_id.is_some_and(|id| id != pipeline.project_id) {
            return false;
        }
        if self.branch.as_deref().is_some_and(|b| b != pipeline.ref_) {
            return false;
        }
        if self.status.is_some_and(|s| s != pipeline.status) {
            return false;
        }
        match self.search.as_deref().filter(|s| !s.is_empty()) {
            Some(search) => matches_search(pipeline, &search.to_lowercase()),
            None => true,
        }
    }

    /// Matching pipelines, newest first, truncated to `limit`.
    pub fn apply<'a>(&self, pipelines: &'a [Pipeline]) -> Vec<&'a Pipeline> {
        let mut selected: Vec<&Pipeline> = pipelines.iter().filter(|p| self.matches(p)).collect();

        // Undated pipelines sort last; `None < Some` so compare reversed
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

fn matches_search(pipeline: &Pipeline, needle: &str) -> bool {
    let project_name = pipeline.project_name.as_deref().unwrap_or_default();
    [
        project_name.to_lowercase(),
        pipeline.ref_.to_lowercase(),
        pipeline.sha.to_lowercase(),
        pipeline.id.to_string(),
    ]
    .iter()
    .any(|field| field.contains(needle))
}

/// Distinct refs across the snapshot, sorted.
pub fn branches(pipelines: &[Pipeline]) -> Vec<String> {
    pipelines
        .iter()
        .map(|p| p.ref_.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Groups pipelines by the UTC day they were created, newest day first.
///
/// Pipelines without a creation time are collected under `None`, last.
pub fn group_by_day<'a>(
    pipelines: &[&'a Pipeline],
) -> IndexMap<Option<NaiveDate>, Vec<&'a Pipeline>> {
    let mut groups: IndexMap<Option<NaiveDate>, Vec<&Pipeline>> = IndexMap::new();
    for &pipeline in pipelines {
        let day = pipeline.created_at.map(|at| at.date_naive());
        groups.entry(day).or_default().push(pipeline);
    }
    groups.sort_by(|a, _, b, _| b.cmp(a));
    groups
}
