use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Deserialize)]
struct CiConfig {
    #[serde(default)]
    stages: Option<Vec<String>>,
}

/// Extracts the top-level `stages:` list from a `.gitlab-ci.yml`.
///
/// Returns `None` when the file does not declare stages or cannot be read as
/// a list of stage names.
pub fn parse_stages(yaml: &str) -> Option<Vec<String>> {
    try_parse_stages(yaml).unwrap_or_else(|e| {
        debug!("Could not read stages from CI config: {e}");
        None
    })
}

/// Like [`parse_stages`], but malformed YAML is an error.
pub fn try_parse_stages(yaml: &str) -> Result<Option<Vec<String>>> {
    let config: CiConfig = serde_yaml::from_str(yaml)?;
    Ok(config.stages.filter(|stages| !stages.is_empty()))
}

/// Reads stages from a local CI configuration file.
///
/// A file given explicitly must parse; only a missing `stages:` key is `None`.
pub fn load_stages(path: &Path) -> Result<Option<Vec<String>>> {
    let contents = std::fs::read_to_string(path)?;
    try_parse_stages(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectorError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_declared_stages_in_order() {
        let yaml = r#"
stages:
  - build
  - test
  - deploy

compile:
  stage: build
  script: make
"#;
        assert_eq!(
            parse_stages(yaml),
            Some(vec!["build".to_string(), "test".to_string(), "deploy".to_string()])
        );
    }

    #[test]
    fn missing_stages_key_is_none() {
        assert_eq!(parse_stages("job:\n  script: echo hi\n"), None);
    }

    #[test]
    fn empty_stages_list_is_none() {
        assert_eq!(parse_stages("stages: []\n"), None);
    }

    #[test]
    fn malformed_yaml_is_none() {
        assert_eq!(parse_stages("stages: [build, test"), None);
        assert_eq!(parse_stages("stages:\n  nested: map\n"), None);
    }

    #[test]
    fn load_stages_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "stages:\n  - lint\n  - test\n").unwrap();

        let stages = load_stages(file.path()).unwrap();

        assert_eq!(stages, Some(vec!["lint".to_string(), "test".to_string()]));
    }

    #[test]
    fn load_stages_rejects_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "stages: [build, test").unwrap();

        let result = load_stages(file.path());

        assert!(
            matches!(result, Err(InspectorError::Yaml(_))),
            "Malformed local CI config should surface as a YAML error"
        );
    }

    #[test]
    fn load_stages_without_stages_key_is_none() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "job:\n  script: make\n").unwrap();

        assert_eq!(load_stages(file.path()).unwrap(), None);
    }
}
