//! Pure functions over pipeline snapshots: stage ordering, status rollups,
//! dashboard counts, list filtering and log highlighting.

pub mod detail;
pub mod filters;
pub mod logs;
pub mod rollup;
pub mod stages;
pub mod stats;

pub use detail::{PipelineView, StageOrderSource};
pub use filters::{branches, group_by_day, PipelineFilter};
pub use logs::{process_log, LineKind, ProcessedLog};
pub use rollup::{pipeline_rollup, stage_summaries, StageSummary};
pub use stages::{group_by_stage, order_stages, order_stages_with, StageOrderOptions};
pub use stats::{aggregate_status, DashboardStats};
