use serde::{Deserialize, Serialize};

use crate::model::{Pipeline, Status};

/// Counts shown on the dashboard overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub running: usize,
    pub pending: usize,
    /// Whole-number percentage of successful pipelines
    pub success_rate: u32,
}

pub fn aggregate_status(pipelines: &[Pipeline]) -> DashboardStats {
    let mut stats = DashboardStats {
        total: pipelines.len(),
        ..DashboardStats::default()
    };

    for pipeline in pipelines {
        match pipeline.status {
            Status::Success => stats.success += 1,
            Status::Failed => stats.failed += 1,
            Status::Running => stats.running += 1,
            Status::Pending => stats.pending += 1,
            Status::Canceled | Status::Skipped => {}
        }
    }

    stats.success_rate = calculate_rate(stats.success, stats.total);
    stats
}

/// `round(count / total * 100)` in integer arithmetic, halves rounding up.
#[allow(clippy::cast_possible_truncation)]
fn calculate_rate(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = count as u64;
    let total = total as u64;
    ((count * 200 + total) / (total * 2)) as u32
}
