// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::*;
use crate::errors::ConfigError;
use crate::serialisation::SerialisationFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Executor properties, loaded once when the executor is built.
///
/// Properties can come from a YAML or TOML document using the field names
/// below, or from flat `maestro.*` keys (a `.properties` file or a map).
///
/// # Fields
/// * `job_tracker_enabled` - Track jobs in the job tracker (defaults to false)
/// * `job_executor_threads` - Number of job workers (defaults to 50)
/// * `operation_declarations` - Files binding operation kinds to handlers
/// * `admin_auth` - Auth that sees every user's jobs (optional)
/// * `serialiser` - Wire format settings for operations
/// * `cache_service` - Cache backend name (defaults to `hash_map`)
/// * `authoriser_path` - Operation auths file for the authoriser hook (optional)
/// * `hooks` - Names of further hooks, run in order after the authoriser
///
/// # Example
/// ```yaml
/// job_tracker_enabled: true
/// job_executor_threads: 4
/// operation_declarations:
///   - configs/operation-declarations.yaml
/// admin_auth: AdminUser
/// serialiser:
///   format: json
///   strict: true
/// authoriser_path: configs/operation-auths.yaml
/// hooks: [monitor]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorProperties {
    pub job_tracker_enabled: bool,
    pub job_executor_threads: usize,
    pub operation_declarations: Vec<String>,
    pub admin_auth: Option<String>,
    pub serialiser: SerialiserProperties,
    pub cache_service: String,
    pub authoriser_path: Option<String>,
    pub hooks: Vec<String>,
}

impl Default for ExecutorProperties {
    fn default() -> Self {
        Self {
            job_tracker_enabled: false,
            job_executor_threads: DEFAULT_JOB_EXECUTOR_THREADS,
            operation_declarations: Vec::new(),
            admin_auth: None,
            serialiser: SerialiserProperties::default(),
            cache_service: DEFAULT_CACHE_SERVICE.to_string(),
            authoriser_path: None,
            hooks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialiserProperties {
    pub format: SerialisationFormat,
    pub strict: bool,
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl ExecutorProperties {
    pub fn with_job_tracker(mut self, enabled: bool) -> Self {
        self.job_tracker_enabled = enabled;
        self
    }

    pub fn with_job_executor_threads(mut self, threads: usize) -> Self {
        self.job_executor_threads = threads;
        self
    }

    pub fn with_admin_auth(mut self, auth: impl Into<String>) -> Self {
        self.admin_auth = Some(auth.into());
        self
    }

    /// Builds properties from flat `maestro.*` keys. Unknown keys are ignored.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut props = Self::default();

        if let Some(v) = map.get(JOB_TRACKER_ENABLED) {
            props.job_tracker_enabled = parse_bool(JOB_TRACKER_ENABLED, v)?;
        }
        if let Some(v) = map.get(JOB_EXECUTOR_THREADS) {
            props.job_executor_threads = v
                .trim()
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or_else(|| ConfigError::InvalidProperty {
                    key: JOB_EXECUTOR_THREADS.to_string(),
                    value: v.clone(),
                })?;
        }
        if let Some(v) = map.get(OPERATION_DECLARATIONS) {
            props.operation_declarations = split_list(v);
        }
        if let Some(v) = map.get(ADMIN_AUTH) {
            let v = v.trim();
            props.admin_auth = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = map.get(AUTHORISER_PATH) {
            let v = v.trim();
            props.authoriser_path = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = map.get(HOOKS) {
            props.hooks = split_list(v);
        }
        if let Some(v) = map.get(SERIALISER_FORMAT) {
            props.serialiser.format =
                v.parse().map_err(|_| ConfigError::InvalidProperty {
                    key: SERIALISER_FORMAT.to_string(),
                    value: v.clone(),
                })?;
        }
        if let Some(v) = map.get(SERIALISER_STRICT) {
            props.serialiser.strict = parse_bool(SERIALISER_STRICT, v)?;
        }
        if let Some(v) = map.get(CACHE_SERVICE_CLASS) {
            props.cache_service = v.trim().to_string();
        }

        Ok(props)
    }

    /// Parses `key=value` lines; blank lines and `#` comments are skipped.
    pub fn from_properties_str(content: &str) -> Result<Self, ConfigError> {
        let map = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self::from_map(&map)
    }

    pub fn job_executor_threads(&self) -> usize {
        self.job_executor_threads.max(1)
    }

    pub fn admin_auth(&self) -> Option<&str> {
        self.admin_auth.as_deref()
    }
}

/// Load executor properties, choosing the format by file extension:
/// `.yaml`/`.yml`, `.toml` or `.properties`.
pub fn load_properties<P: AsRef<Path>>(path: P) -> Result<ExecutorProperties, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;

    let parse_error = |reason: String| ConfigError::Parse {
        path: display.clone(),
        reason,
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))
        }
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Some("properties") => ExecutorProperties::from_properties_str(&content),
        other => Err(parse_error(format!(
            "unsupported properties format {:?}",
            other.unwrap_or("")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let props = ExecutorProperties::default();
        assert!(!props.job_tracker_enabled);
        assert_eq!(props.job_executor_threads, 50);
        assert_eq!(props.cache_service, "hash_map");
        assert_eq!(props.serialiser.format, SerialisationFormat::Json);
        assert!(!props.serialiser.strict);
    }

    #[test]
    fn parse_yaml_properties_with_defaults() {
        let yaml = r#"
job_tracker_enabled: true
operation_declarations: [a.yaml, b.yaml]
"#;
        let props: ExecutorProperties = serde_yaml::from_str(yaml).unwrap();
        assert!(props.job_tracker_enabled);
        assert_eq!(props.job_executor_threads, 50);
        assert_eq!(props.operation_declarations, vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn parse_toml_properties() {
        let toml = r#"
job_executor_threads = 8
admin_auth = "AdminUser"

[serialiser]
format = "yaml"
strict = true
"#;
        let props: ExecutorProperties = toml::from_str(toml).unwrap();
        assert_eq!(props.job_executor_threads, 8);
        assert_eq!(props.admin_auth(), Some("AdminUser"));
        assert_eq!(props.serialiser.format, SerialisationFormat::Yaml);
        assert!(props.serialiser.strict);
    }

    #[test]
    fn flat_keys() {
        let map = HashMap::from([
            (JOB_TRACKER_ENABLED.to_string(), "true".to_string()),
            (JOB_EXECUTOR_THREADS.to_string(), "3".to_string()),
            (OPERATION_DECLARATIONS.to_string(), "x.yaml, y.yaml,".to_string()),
            (ADMIN_AUTH.to_string(), "AdminUser".to_string()),
            (SERIALISER_STRICT.to_string(), "true".to_string()),
            (HOOKS.to_string(), "monitor".to_string()),
            ("unrelated.key".to_string(), "ignored".to_string()),
        ]);
        let props = ExecutorProperties::from_map(&map).unwrap();
        assert!(props.job_tracker_enabled);
        assert_eq!(props.job_executor_threads, 3);
        assert_eq!(props.operation_declarations, vec!["x.yaml", "y.yaml"]);
        assert_eq!(props.admin_auth(), Some("AdminUser"));
        assert!(props.serialiser.strict);
        assert_eq!(props.hooks, vec!["monitor"]);
    }

    #[test]
    fn invalid_flat_values_are_rejected() {
        struct TestCase {
            key: &'static str,
            value: &'static str,
        }

        let cases = vec![
            TestCase { key: JOB_TRACKER_ENABLED, value: "yes please" },
            TestCase { key: JOB_EXECUTOR_THREADS, value: "-1" },
            TestCase { key: JOB_EXECUTOR_THREADS, value: "0" },
            TestCase { key: SERIALISER_FORMAT, value: "xml" },
        ];

        for case in cases {
            let map = HashMap::from([(case.key.to_string(), case.value.to_string())]);
            match ExecutorProperties::from_map(&map) {
                Err(ConfigError::InvalidProperty { key, value }) => {
                    assert_eq!(key, case.key);
                    assert_eq!(value, case.value);
                }
                other => panic!("{}={} should be rejected, got {:?}", case.key, case.value, other),
            }
        }
    }

    #[test]
    fn properties_file_lines() {
        let content = "# executor\nmaestro.executor.job.tracker.enabled = true\n\nmaestro.executor.admin.auth=Admin\n";
        let props = ExecutorProperties::from_properties_str(content).unwrap();
        assert!(props.job_tracker_enabled);
        assert_eq!(props.admin_auth(), Some("Admin"));
    }
}
