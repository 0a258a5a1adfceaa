use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Pipeline, Project};

/// Pipelines captured to a JSON file, for offline inspection.
///
/// Either a bare array of pipelines or an object carrying the pipelines
/// together with per-project CI stage lists and job logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub pipelines: Vec<Pipeline>,
    /// CI `stages:` list keyed by project id
    #[serde(default)]
    pub ci_stages: HashMap<u64, Vec<String>>,
    /// Raw job traces keyed by job id
    #[serde(default)]
    pub job_logs: HashMap<u64, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&contents)?;
        debug!(
            "Loaded {} pipelines from {}",
            snapshot.pipelines.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Listed projects, or one entry per project id seen in the pipelines.
    pub fn projects(&self) -> Vec<Project> {
        if !self.projects.is_empty() {
            return self.projects.clone();
        }

        let mut seen: BTreeMap<u64, Option<&str>> = BTreeMap::new();
        for pipeline in &self.pipelines {
            let name = seen.entry(pipeline.project_id).or_default();
            if name.is_none() {
                *name = pipeline.project_name.as_deref();
            }
        }

        seen.into_iter()
            .map(|(id, name)| {
                let name = name.map_or_else(|| id.to_string(), str::to_string);
                Project {
                    id,
                    path_with_namespace: name.clone(),
                    name,
                    description: None,
                    web_url: None,
                    last_activity_at: None,
                }
            })
            .collect()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim_start().starts_with('[') {
            let pipelines: Vec<Pipeline> = serde_json::from_str(json)?;
            Ok(Self {
                pipelines,
                ..Self::default()
            })
        } else {
            Ok(serde_json::from_str(json)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn accepts_bare_pipeline_array() {
        let json = r#"[{"id": 1, "project_id": 2, "ref": "main", "status": "success"}]"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.pipelines.len(), 1);
        assert!(snapshot.ci_stages.is_empty());
    }

    #[test]
    fn accepts_full_snapshot_object() {
        let json = r#"{
            "pipelines": [{"id": 1, "project_id": 2, "ref": "main", "status": "failed"}],
            "ci_stages": {"2": ["build", "test"]},
            "job_logs": {"10": "ERROR: nope"}
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.ci_stages[&2], vec!["build", "test"]);
        assert_eq!(snapshot.job_logs[&10], "ERROR: nope");
    }

    #[test]
    fn projects_derive_from_pipelines() {
        let json = r#"[
            {"id": 3, "project_id": 9, "ref": "main", "status": "success"},
            {"id": 2, "project_id": 4, "project_name": "backend-api", "ref": "main", "status": "success"},
            {"id": 1, "project_id": 9, "project_name": "frontend", "ref": "dev", "status": "failed"}
        ]"#;
        let snapshot = Snapshot::from_json(json).unwrap();

        let projects = snapshot.projects();

        let names: Vec<(u64, &str)> = projects.iter().map(|p| (p.id, p.name.as_str())).collect();
        assert_eq!(names, vec![(4, "backend-api"), (9, "frontend")]);
    }

    #[test]
    fn listed_projects_take_precedence() {
        let json = r#"{
            "pipelines": [{"id": 1, "project_id": 2, "ref": "main", "status": "failed"}],
            "projects": [{"id": 2, "name": "api", "path_with_namespace": "team/api"}]
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();

        let projects = snapshot.projects();

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].path_with_namespace, "team/api");
    }

    #[test]
    fn rejects_unknown_status() {
        let json = r#"[{"id": 1, "project_id": 2, "ref": "main", "status": "weird"}]"#;
        assert!(Snapshot::from_json(json).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"[{{"id": 5, "project_id": 1, "ref": "dev", "status": "running"}}]"#
        )
        .unwrap();

        let snapshot = Snapshot::load(file.path()).unwrap();

        assert_eq!(snapshot.pipelines[0].id, 5);
    }
}
