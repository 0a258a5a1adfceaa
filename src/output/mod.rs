mod exports;
mod format;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::{emit, export_json};
pub use format::{format_bytes, format_duration};
pub use progress::FetchProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{
    render_branches, render_dashboard, render_log, render_pipeline_detail, render_pipeline_list,
    render_projects,
};

/// Prints the Build Inspector banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔍 Build Inspector"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI/CD pipeline inspector")
    );
}
