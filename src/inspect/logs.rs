use serde::{Deserialize, Serialize};

/// Substrings (lower-case) that mark a log line worth highlighting.
const ERROR_MARKERS: [&str; 6] = ["error", "failed", "exception", "traceback", "fatal", "[err]"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Error,
    Warning,
}

/// A flagged line of a job trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLine {
    /// 1-based
    pub line_number: usize,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: LineKind,
}

/// A job trace with its flagged lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedLog {
    pub job_id: u64,
    pub pipeline_id: u64,
    pub raw_log: String,
    pub error_lines: Vec<ErrorLine>,
}

pub fn process_log(raw_log: String, job_id: u64, pipeline_id: u64) -> ProcessedLog {
    let error_lines = find_error_lines(&raw_log);
    ProcessedLog {
        job_id,
        pipeline_id,
        raw_log,
        error_lines,
    }
}

pub fn find_error_lines(log: &str) -> Vec<ErrorLine> {
    log.split('\n')
        .enumerate()
        .filter_map(|(idx, line)| {
            classify_line(line).map(|kind| ErrorLine {
                line_number: idx + 1,
                content: line.trim_end_matches('\r').to_string(),
                kind,
            })
        })
        .collect()
}

fn classify_line(line: &str) -> Option<LineKind> {
    let lower = line.to_lowercase();
    if !ERROR_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return None;
    }

    let upper = line.to_uppercase();
    if upper.contains("ERROR") || upper.contains("FAILED") {
        Some(LineKind::Error)
    } else {
        Some(LineKind::Warning)
    }
}
