use std::fmt::Write;

use chrono::NaiveDate;
use comfy_table::{Cell, Color as TableColor};
use indexmap::IndexMap;

use crate::inspect::{
    order_stages, stage_summaries, DashboardStats, LineKind, PipelineView, ProcessedLog,
    StageOrderSource,
};
use crate::model::{Pipeline, Project};

use super::format::{format_bytes, format_duration};
use super::styling::{bright, bright_green, bright_red, bright_yellow, cyan, dim, status_styled};
use super::tables::{color_coded_success_cell, create_cyan_header, create_table, status_cell};

const SHORT_SHA_LEN: usize = 8;

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn short_sha(sha: &str) -> &str {
    sha.get(..SHORT_SHA_LEN).unwrap_or(sha)
}

fn format_created(pipeline: &Pipeline) -> String {
    pipeline
        .created_at
        .map_or_else(|| "N/A".to_string(), |at| at.format("%b %d %H:%M").to_string())
}

/// Stages in run order with their rolled-up status, e.g. "build (success) → test (failed)".
fn stage_trail(pipeline: &Pipeline) -> String {
    if pipeline.jobs.is_empty() {
        return "-".to_string();
    }

    let order = order_stages(&pipeline.jobs, None);
    stage_summaries(&pipeline.jobs, &order)
        .iter()
        .map(|stage| match stage.status {
            Some(status) => format!("{} ({status})", stage.name),
            None => stage.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(" → ")
}

fn pipelines_table(pipelines: &[&Pipeline], show_stages: bool) -> comfy_table::Table {
    let mut table = create_table();
    let mut header = vec![
        "Pipeline", "Project", "Ref", "Commit", "Status", "Duration", "Created",
    ];
    if show_stages {
        header.push("Stages");
    }
    table.set_header(create_cyan_header(&header));

    for pipeline in pipelines {
        let mut row = vec![
            Cell::new(format!("#{}", pipeline.id)),
            Cell::new(pipeline.project_name.as_deref().unwrap_or("-")),
            Cell::new(&pipeline.ref_),
            Cell::new(short_sha(&pipeline.sha)).fg(TableColor::DarkGrey),
            status_cell(Some(pipeline.status)),
            Cell::new(format_duration(pipeline.duration)),
            Cell::new(format_created(pipeline)),
        ];
        if show_stages {
            row.push(Cell::new(stage_trail(pipeline)));
        }
        table.add_row(row);
    }
    table
}

/// Overview counts followed by the most recent pipelines.
pub fn render_dashboard(stats: &DashboardStats, recent: &[&Pipeline]) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let mut table = create_table();
    table.set_header(create_cyan_header(&[
        "Total", "Success", "Failed", "Running", "Pending", "Success Rate",
    ]));
    table.add_row(vec![
        Cell::new(stats.total),
        Cell::new(stats.success).fg(TableColor::Green),
        Cell::new(stats.failed).fg(TableColor::Red),
        Cell::new(stats.running).fg(TableColor::Cyan),
        Cell::new(stats.pending).fg(TableColor::Yellow),
        color_coded_success_cell(stats.success_rate),
    ]);
    let _ = writeln!(output, "{table}\n");

    add_section_header(&mut output, "🕒", "Recent Pipelines");
    if recent.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No pipelines found."));
    } else {
        let _ = writeln!(output, "{}", pipelines_table(recent, false));
    }

    output
}

/// Pipelines grouped by creation day.
pub fn render_pipeline_list(groups: &IndexMap<Option<NaiveDate>, Vec<&Pipeline>>) -> String {
    let mut output = String::new();
    let count: usize = groups.values().map(Vec::len).sum();

    add_section_header(&mut output, "📋", "Pipelines");
    let _ = writeln!(output, "  {} {}\n", bright_yellow(count), dim("pipelines found"));

    for (day, pipelines) in groups {
        let label = day.map_or_else(
            || "Unknown date".to_string(),
            |d| d.format("%B %-d, %Y").to_string(),
        );
        let _ = writeln!(output, "{}", cyan(label));
        let _ = writeln!(output, "{}\n", pipelines_table(pipelines, true));
    }

    output
}

#[allow(clippy::too_many_lines)]
pub fn render_pipeline_detail(view: &PipelineView<'_>) -> String {
    let mut output = String::new();
    let pipeline = view.pipeline;

    add_section_header(&mut output, "🔍", &format!("Pipeline #{}", pipeline.id));
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Project:"),
        cyan(pipeline.project_name.as_deref().unwrap_or("-")),
        dim("Ref:"),
        cyan(&pipeline.ref_),
        dim("Commit:"),
        dim(short_sha(&pipeline.sha)),
        dim("Status:"),
        status_styled(Some(pipeline.status)),
        dim("Duration:"),
        bright_yellow(format_duration(pipeline.duration)),
        dim("Created:"),
        dim(format_created(pipeline)),
    );

    if let Some(results) = pipeline.test_results {
        add_section_header(&mut output, "🧪", "Test Results");
        let _ = writeln!(
            output,
            "  {} passed  {} failed  {} skipped  {} total\n",
            bright_green(results.passed),
            bright_red(results.failed),
            dim(results.skipped),
            bright(results.total),
        );
    }

    add_section_header(&mut output, "🧱", "Stages");
    if view.stages.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No jobs in this pipeline."));
        return output;
    }

    let order_note = match view.stage_order {
        StageOrderSource::CiConfig => "order from .gitlab-ci.yml",
        StageOrderSource::Default => "default stage order",
    };
    let _ = writeln!(
        output,
        "  {} {}\n",
        dim(view.stages.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(" → ")),
        dim(format!("({order_note})"))
    );

    let mut stages_table = create_table();
    stages_table.set_header(create_cyan_header(&["Stage", "Status", "Jobs", "Duration"]));
    for stage in &view.stages {
        stages_table.add_row(vec![
            Cell::new(&stage.name),
            status_cell(stage.status),
            Cell::new(stage.jobs),
            Cell::new(format_duration(stage.duration)),
        ]);
    }
    let _ = writeln!(output, "{stages_table}\n");

    add_section_header(&mut output, "⚙️", "Jobs");
    let mut jobs_table = create_table();
    jobs_table.set_header(create_cyan_header(&[
        "Stage", "Job", "Status", "Duration", "Started", "Artifacts",
    ]));
    for (stage, jobs) in &view.jobs_by_stage {
        for job in jobs {
            let artifacts = job.artifacts_file.as_ref().map_or_else(
                || "-".to_string(),
                |a| format!("{} ({})", a.filename, format_bytes(a.size)),
            );
            let started = job
                .started_at
                .map_or_else(|| "N/A".to_string(), |at| at.format("%H:%M:%S").to_string());
            jobs_table.add_row(vec![
                Cell::new(stage),
                Cell::new(format!("{} #{}", job.name, job.id)),
                status_cell(Some(job.status)),
                Cell::new(format_duration(job.duration)),
                Cell::new(started),
                Cell::new(artifacts),
            ]);
        }
    }
    let _ = writeln!(output, "{jobs_table}");

    output
}

pub fn render_log(log: &ProcessedLog) -> String {
    let mut output = String::new();

    add_section_header(
        &mut output,
        "📜",
        &format!("Job #{} (pipeline #{})", log.job_id, log.pipeline_id),
    );

    if log.error_lines.is_empty() {
        let _ = writeln!(output, "  {}", bright_green("No errors found in log."));
        return output;
    }

    let errors = log
        .error_lines
        .iter()
        .filter(|l| l.kind == LineKind::Error)
        .count();
    let _ = writeln!(
        output,
        "  {} errors, {} warnings\n",
        bright_red(errors),
        bright_yellow(log.error_lines.len() - errors)
    );

    for line in &log.error_lines {
        let content = match line.kind {
            LineKind::Error => bright_red(&line.content),
            LineKind::Warning => bright_yellow(&line.content),
        };
        let _ = writeln!(output, "  {} {}", dim(format!("{:>5}", line.line_number)), content);
    }

    output
}

pub fn render_projects(projects: &[Project]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "📁", "Projects");
    if projects.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No projects found."));
        return output;
    }

    let mut table = create_table();
    table.set_header(create_cyan_header(&["ID", "Project", "Path", "Last Activity"]));
    for project in projects {
        let last_activity = project
            .last_activity_at
            .map_or_else(|| "N/A".to_string(), |at| at.format("%b %d %H:%M").to_string());
        table.add_row(vec![
            Cell::new(project.id),
            Cell::new(&project.name),
            Cell::new(&project.path_with_namespace).fg(TableColor::DarkGrey),
            Cell::new(last_activity),
        ]);
    }
    let _ = writeln!(output, "{table}");
    output
}

pub fn render_branches(branches: &[String]) -> String {
    let mut output = String::new();
    add_section_header(&mut output, "🌿", "Branches");
    if branches.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No branches found."));
    }
    for branch in branches {
        let _ = writeln!(output, "  {}", cyan(branch));
    }
    output
}
