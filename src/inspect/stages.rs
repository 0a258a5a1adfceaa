use indexmap::{IndexMap, IndexSet};

use crate::model::Job;

/// Conventional GitLab stage order used when no CI configuration is available.
pub const STANDARD_STAGE_ORDER: [&str; 5] = ["build", "test", "deploy", "release", "cleanup"];

/// Display options applied on top of the computed stage order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageOrderOptions {
    /// Reverse the merged order when it came from CI configuration.
    pub reverse_external: bool,
}

/// Orders the distinct stages of `jobs`.
///
/// With a non-empty `external_order` (the `stages:` list of the CI config) the
/// configured order wins and job stages missing from it are appended in
/// first-seen order. Otherwise stages are ranked by [`STANDARD_STAGE_ORDER`],
/// with unknown stages after the known ones in alphabetical order.
///
/// Every distinct job stage appears exactly once in the result.
pub fn order_stages(jobs: &[Job], external_order: Option<&[String]>) -> Vec<String> {
    order_stages_with(jobs, external_order, StageOrderOptions::default())
}

pub fn order_stages_with(
    jobs: &[Job],
    external_order: Option<&[String]>,
    options: StageOrderOptions,
) -> Vec<String> {
    let distinct = distinct_stages(jobs);

    match external_order {
        Some(external) if !external.is_empty() => {
            let mut ordered = merge_with_external(&distinct, external);
            if options.reverse_external {
                ordered.reverse();
            }
            ordered
        }
        _ => sort_by_priority(distinct),
    }
}

/// Groups jobs under their stage, keyed in `ordered_stages` order.
///
/// Listed stages without jobs get an empty group. Jobs whose stage is not
/// listed are still returned, in groups appended after the listed ones.
pub fn group_by_stage<'a>(
    jobs: &'a [Job],
    ordered_stages: &[String],
) -> IndexMap<String, Vec<&'a Job>> {
    let mut groups: IndexMap<String, Vec<&Job>> = ordered_stages
        .iter()
        .map(|stage| (stage.clone(), Vec::new()))
        .collect();

    for job in jobs {
        groups.entry(job.stage.clone()).or_default().push(job);
    }

    groups
}

fn distinct_stages(jobs: &[Job]) -> IndexSet<&str> {
    jobs.iter().map(|job| job.stage.as_str()).collect()
}

fn merge_with_external(distinct: &IndexSet<&str>, external: &[String]) -> Vec<String> {
    let mut ordered: IndexSet<&str> = external
        .iter()
        .map(String::as_str)
        .filter(|stage| distinct.contains(stage))
        .collect();

    // Stages used by jobs but missing from the configuration go last
    ordered.extend(distinct.iter().copied());

    ordered.into_iter().map(str::to_owned).collect()
}

fn standard_rank(stage: &str) -> usize {
    let lower = stage.to_lowercase();
    STANDARD_STAGE_ORDER
        .iter()
        .position(|known| *known == lower)
        .unwrap_or(STANDARD_STAGE_ORDER.len())
}

fn sort_by_priority(distinct: IndexSet<&str>) -> Vec<String> {
    let mut stages: Vec<&str> = distinct.into_iter().collect();
    stages.sort_by(|a, b| standard_rank(a).cmp(&standard_rank(b)).then_with(|| a.cmp(b)));
    stages.into_iter().map(str::to_owned).collect()
}
