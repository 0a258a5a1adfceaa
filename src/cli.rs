use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::inspect::{
    aggregate_status, branches, group_by_day, DashboardStats, PipelineFilter, PipelineView,
    StageOrderOptions,
};
use crate::model::{Pipeline, Project, Status};
use crate::output::{self, FetchProgress};
use crate::providers::gitlab::ci_config::load_stages;
use crate::providers::GitLabProvider;
use crate::snapshot::Snapshot;
use crate::source::DataSource;

#[derive(Parser)]
#[command(name = "build-inspector")]
#[command(author, version, about = "CI/CD pipeline inspector", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./build-inspector.toml and friends)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read pipelines from a JSON snapshot instead of the GitLab API
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// GitLab instance base URL
    #[arg(short, long, global = true, env = "GITLAB_URL")]
    url: Option<String>,

    /// GitLab project id or path (e.g., 'group/project')
    #[arg(short = 'P', long, global = true)]
    project: Option<String>,

    #[arg(short, long, global = true, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall pipeline counts and the most recent pipelines
    Dashboard {
        /// Number of recent pipelines to list
        #[arg(short, long, default_value_t = 5)]
        recent: usize,

        /// Refresh every N seconds (config interval when N is omitted)
        #[arg(short, long, num_args = 0..=1, default_missing_value = "0")]
        watch: Option<u64>,
    },
    /// Filterable pipeline list grouped by day
    Pipelines {
        #[arg(long)]
        project_id: Option<u64>,

        #[arg(short, long)]
        branch: Option<String>,

        #[arg(short, long, value_parser = parse_status)]
        status: Option<Status>,

        /// Case-insensitive match on project, ref, commit or id
        #[arg(long)]
        search: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Stages, jobs and test results of one pipeline
    Pipeline {
        id: u64,

        /// Local .gitlab-ci.yml to take the stage order from
        #[arg(long)]
        ci_config: Option<PathBuf>,

        /// Show CI-configured stages last-to-first
        #[arg(long, default_value_t = false)]
        reverse_ci_stages: bool,
    },
    /// Error and warning lines of a job log
    Logs { pipeline_id: u64, job_id: u64 },
    /// Distinct branches with pipelines
    Branches,
    /// Projects visible to the token
    Projects,
    /// Download a job's artifacts archive (to --output, or artifacts-<job-id>.zip)
    Artifacts { job_id: u64 },
}

fn parse_status(value: &str) -> std::result::Result<Status, String> {
    Status::parse(value).ok_or_else(|| {
        format!("unknown status '{value}' (expected success, failed, running, pending, canceled or skipped)")
    })
}

#[derive(Serialize)]
struct DashboardReport<'a> {
    stats: DashboardStats,
    recent: Vec<&'a Pipeline>,
}

#[derive(Serialize)]
struct BranchesReport<'a> {
    branches: &'a [String],
}

#[derive(Serialize)]
struct ProjectsReport<'a> {
    projects: &'a [Project],
}

/// Output settings resolved from flags and config.
struct Render<'a> {
    format: OutputFormat,
    pretty: bool,
    path: Option<&'a Path>,
}

impl Render<'_> {
    fn emit<T, F>(&self, value: &T, render_table: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> String,
    {
        match self.format {
            OutputFormat::Json => {
                let mut buffer = Vec::new();
                output::export_json(value, self.pretty, &mut buffer)?;
                output::emit(&String::from_utf8_lossy(&buffer), self.path)
            }
            OutputFormat::Table => output::emit(&render_table(), self.path),
        }
    }
}

impl Cli {
    fn data_source(&self, config: &Config) -> Result<DataSource> {
        if let Some(input) = &self.input {
            info!("Reading pipelines from snapshot: {}", input.display());
            return Ok(DataSource::Snapshot(Snapshot::load(input)?));
        }

        let Some(project) = self.project.clone().or_else(|| config.gitlab.project.clone()) else {
            bail!("No data source: pass --input <snapshot.json> or --project <id|path>");
        };

        let url = self.url.as_deref().unwrap_or(&config.gitlab.base_url);
        let token = self
            .token
            .as_deref()
            .or(config.gitlab.token.as_deref())
            .map(Token::from);

        info!("Inspecting GitLab project {project} at {url}");
        let provider = GitLabProvider::new(url, project, token)?;

        Ok(DataSource::GitLab {
            provider,
            limit: config.gitlab.limit,
        })
    }

    async fn fetch_pipelines(
        source: &DataSource,
        filter: &PipelineFilter,
        with_jobs: bool,
    ) -> Result<Vec<Pipeline>> {
        if matches!(source, DataSource::Snapshot(_)) {
            return Ok(source.pipelines(filter, with_jobs).await?);
        }

        let progress = FetchProgress::start("Fetching pipelines");
        match source.pipelines(filter, with_jobs).await {
            Ok(pipelines) => {
                progress.finish(&format!("Fetched {} pipelines", pipelines.len()));
                Ok(pipelines)
            }
            Err(e) => {
                progress.abandon();
                Err(e.into())
            }
        }
    }

    async fn show_dashboard(source: &DataSource, render: &Render<'_>, recent: usize) -> Result<()> {
        let pipelines = Self::fetch_pipelines(source, &PipelineFilter::default(), false).await?;
        let stats = aggregate_status(&pipelines);
        let recent: Vec<&Pipeline> = pipelines.iter().take(recent).collect();

        let report = DashboardReport { stats, recent };
        render.emit(&report, || output::render_dashboard(&report.stats, &report.recent))
    }

    /// Redraws the dashboard every `interval` until `shutdown` completes.
    ///
    /// `shutdown` is polled during refreshes as well as between them.
    async fn watch_dashboard<S>(
        source: &DataSource,
        render: &Render<'_>,
        recent: usize,
        interval: Duration,
        shutdown: S,
    ) -> Result<()>
    where
        S: Future,
    {
        info!("Refreshing dashboard every {}s (Ctrl-C to stop)", interval.as_secs());
        let clear = render.format == OutputFormat::Table && render.path.is_none();
        tokio::pin!(shutdown);

        loop {
            if clear {
                if let Err(e) = console::Term::stdout().clear_screen() {
                    debug!("Could not clear screen: {e}");
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = Self::show_dashboard(source, render, recent) => {
                    // A failed refresh keeps the previous screen and tries again next tick
                    if let Err(e) = result {
                        warn!("Dashboard refresh failed: {e:#}");
                    }
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        info!("Stopped watching");
        Ok(())
    }

    async fn save_artifacts(source: &DataSource, job_id: u64, path: Option<&Path>) -> Result<()> {
        let bytes = source.artifacts(job_id).await?;

        let default_path = PathBuf::from(format!("artifacts-{job_id}.zip"));
        let path = path.unwrap_or(&default_path);
        std::fs::write(path, &bytes)?;

        println!(
            "Saved {} of artifacts for job {job_id} to {}",
            output::format_bytes(bytes.len() as u64),
            path.display()
        );
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let source = self.data_source(&config)?;

        let render = Render {
            format: if self.json {
                OutputFormat::Json
            } else {
                config.display.format
            },
            pretty: self.pretty || config.display.pretty,
            path: self.output.as_deref(),
        };

        match &self.command {
            Commands::Dashboard { recent, watch } => match watch {
                Some(seconds) => {
                    let seconds = if *seconds == 0 {
                        config.watch.interval_seconds
                    } else {
                        *seconds
                    };
                    let interval = Duration::from_secs(seconds.max(1));
                    Self::watch_dashboard(
                        &source,
                        &render,
                        *recent,
                        interval,
                        tokio::signal::ctrl_c(),
                    )
                    .await
                }
                None => Self::show_dashboard(&source, &render, *recent).await,
            },
            Commands::Pipelines {
                project_id,
                branch,
                status,
                search,
                limit,
            } => {
                let filter = PipelineFilter {
                    project_id: *project_id,
                    branch: branch.clone(),
                    status: *status,
                    search: search.clone(),
                    limit: *limit,
                };
                let pipelines = Self::fetch_pipelines(&source, &filter, true).await?;
                let refs: Vec<&Pipeline> = pipelines.iter().collect();

                render.emit(&pipelines, || {
                    output::render_pipeline_list(&group_by_day(&refs))
                })
            }
            Commands::Pipeline {
                id,
                ci_config,
                reverse_ci_stages,
            } => {
                let pipeline = source.pipeline(*id).await?;

                let ci_stages = match ci_config {
                    Some(path) => load_stages(path)?,
                    None => source.ci_stages(&pipeline).await,
                };

                let options = StageOrderOptions {
                    reverse_external: *reverse_ci_stages || config.display.reverse_ci_stages,
                };
                let view = PipelineView::build(&pipeline, ci_stages.as_deref(), options);

                render.emit(&view, || output::render_pipeline_detail(&view))
            }
            Commands::Logs {
                pipeline_id,
                job_id,
            } => {
                let log = source.job_log(*pipeline_id, *job_id).await?;
                render.emit(&log, || output::render_log(&log))
            }
            Commands::Branches => {
                let pipelines = Self::fetch_pipelines(&source, &PipelineFilter::default(), false).await?;
                let branches = branches(&pipelines);

                render.emit(&BranchesReport { branches: &branches }, || {
                    output::render_branches(&branches)
                })
            }
            Commands::Projects => {
                let projects = source.projects().await?;

                render.emit(&ProjectsReport { projects: &projects }, || {
                    output::render_projects(&projects)
                })
            }
            Commands::Artifacts { job_id } => {
                Self::save_artifacts(&source, *job_id, self.output.as_deref()).await
            }
        }
    }
}
