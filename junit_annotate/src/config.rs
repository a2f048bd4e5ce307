use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

use crate::transformer::{TransformerSpec, read_transformers};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Transformers are accepted either as structured rules or as the JSON text
/// form used on the command line.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TransformersConfig {
    Rules(Vec<TransformerSpec>),
    Json(String),
}

impl TransformersConfig {
    pub fn specs(&self) -> Vec<TransformerSpec> {
        match self {
            TransformersConfig::Rules(rules) => rules.clone(),
            TransformersConfig::Json(raw) => read_transformers(raw),
        }
    }
}

/// A value given once for every check, or once per check.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PerCheck {
    One(String),
    Many(Vec<String>),
}

impl PerCheck {
    pub fn items(&self) -> Vec<String> {
        match self {
            PerCheck::One(value) => vec![value.clone()],
            PerCheck::Many(values) => values.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateConfig {
    pub report_paths: Option<PerCheck>,
    pub check_name: Option<PerCheck>,
    pub summary: Option<PerCheck>,

    pub include_passed: Option<bool>,
    pub include_skipped: Option<bool>,
    pub annotate_notice: Option<bool>,
    pub check_retries: Option<bool>,
    pub exclude_sources: Option<Vec<String>>,
    pub check_title_template: Option<String>,
    pub bread_crumb_delimiter: Option<String>,
    pub test_files_prefix: Option<String>,
    pub transformers: Option<TransformersConfig>,
    pub follow_symlink: Option<bool>,
    pub annotations_limit: Option<i64>,
    pub truncate_stack_traces: Option<bool>,
    pub fail_on_parse_error: Option<bool>,
    pub resolve_ignore_classname: Option<bool>,

    pub annotate_only: Option<bool>,
    pub fail_on_failure: Option<bool>,
    pub require_tests: Option<bool>,
    pub require_passed_tests: Option<bool>,
    pub detailed_summary: Option<bool>,
    pub flaky_summary: Option<bool>,
    pub group_suite: Option<bool>,
    pub include_time_in_summary: Option<bool>,
    pub skip_success_summary: Option<bool>,
    pub verbose: Option<bool>,
}

pub fn find_repo_root(start: &Path) -> PathBuf {
    git2::Repository::discover(start)
        .ok()
        .and_then(|repo| repo.workdir().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| start.to_path_buf())
}

pub fn discover_config_path(repo_root: &Path) -> Option<PathBuf> {
    let names = [
        "junit-annotate.toml",
        ".junit-annotate.toml",
        ".junit-annotate.json",
        ".junit-annotate.json5",
        ".junit-annotate.yaml",
        ".junit-annotate.yml",
    ];
    names
        .into_iter()
        .map(|name| repo_root.join(name))
        .find(|p| p.is_file())
}

pub fn load_annotate_config(repo_root: &Path) -> Result<AnnotateConfig, ConfigError> {
    if let Some(path) = discover_config_path(repo_root) {
        return load_annotate_config_from_path(&path);
    }

    let cargo_toml_path = repo_root.join("Cargo.toml");
    if cargo_toml_path.is_file() {
        if let Some(config) = load_toml_config(&cargo_toml_path, TomlConfigSource::CargoPackageMetadata)? {
            return Ok(config);
        }
    }
    Ok(AnnotateConfig::default())
}

pub fn load_annotate_config_from_path(path: &Path) -> Result<AnnotateConfig, ConfigError> {
    let ext = path
        .extension()
        .and_then(|x| x.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" | "json5" => load_json_config(path),
        "yaml" | "yml" => load_yaml_config(path),
        "toml" => load_toml_config(path, TomlConfigSource::FullFile).map(|v| v.unwrap_or_default()),
        _ => Ok(AnnotateConfig::default()),
    }
}

fn read_config_text(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_json_config(path: &Path) -> Result<AnnotateConfig, ConfigError> {
    let raw = read_config_text(path)?;
    json5::from_str::<AnnotateConfig>(&raw)
        .or_else(|_| serde_json::from_str::<AnnotateConfig>(&raw))
        .map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

fn load_yaml_config(path: &Path) -> Result<AnnotateConfig, ConfigError> {
    let raw = read_config_text(path)?;
    serde_yaml::from_str::<AnnotateConfig>(&raw).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TomlConfigSource {
    FullFile,
    CargoPackageMetadata,
}

fn load_toml_config(path: &Path, source: TomlConfigSource) -> Result<Option<AnnotateConfig>, ConfigError> {
    let raw = read_config_text(path)?;
    let toml_value = toml::from_str::<toml::Value>(&raw).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    let maybe_table_value = match source {
        TomlConfigSource::FullFile => Some(toml_value),
        TomlConfigSource::CargoPackageMetadata => extract_cargo_package_metadata(&toml_value),
    };
    let Some(table_value) = maybe_table_value else {
        return Ok(None);
    };

    let json_value = serde_json::to_value(table_value).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    serde_json::from_value::<AnnotateConfig>(normalize_toml_keys_to_camel_case(&json_value))
        .map(Some)
        .map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

fn extract_cargo_package_metadata(value: &toml::Value) -> Option<toml::Value> {
    value
        .as_table()
        .and_then(|root| root.get("package"))
        .and_then(|package| package.as_table())
        .and_then(|package_table| package_table.get("metadata"))
        .and_then(|metadata| metadata.as_table())
        .and_then(|metadata_table| metadata_table.get("junit-annotate"))
        .cloned()
}

/// TOML files use snake_case or kebab-case keys; the config model is camelCase.
fn normalize_toml_keys_to_camel_case(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(object) => JsonValue::Object(
            object
                .iter()
                .map(|(key, value)| (normalize_toml_key(key), normalize_toml_keys_to_camel_case(value)))
                .collect(),
        ),
        JsonValue::Array(array) => JsonValue::Array(array.iter().map(normalize_toml_keys_to_camel_case).collect()),
        other => other.clone(),
    }
}

fn normalize_toml_key(key: &str) -> String {
    if !key.contains(['_', '-']) {
        return key.to_string();
    }

    let mut segments = key.split(['_', '-']).filter(|segment| !segment.is_empty());
    let Some(first_segment) = segments.next() else {
        return key.to_string();
    };

    let mut normalized_key = String::from(first_segment);
    for segment in segments {
        let mut chars = segment.chars();
        let Some(first_char) = chars.next() else {
            continue;
        };
        normalized_key.push(first_char.to_ascii_uppercase());
        normalized_key.extend(chars);
    }
    normalized_key
}

/// Picks the value of a per-check setting for check `index` out of `total`.
///
/// A single value is shared by every check. With several checks, a list whose
/// length differs from the number of checks is most likely a mistake and is
/// reported, but still used where it has an entry.
pub fn retrieve(name: &str, items: &[String], index: usize, total: usize) -> String {
    let clean = |value: &String| value.replacen('\n', "", 1);
    if total <= 1 {
        return match items {
            [single] => clean(single),
            _ => String::new(),
        };
    }
    if !items.is_empty() && items.len() != total {
        warn!("{name} has a different number of items than the 'reportPaths' input. This is usually a bug.");
    }
    match items {
        [] => String::new(),
        [single] => clean(single),
        _ => match items.get(index) {
            Some(value) => clean(value),
            None => {
                error!("{name} does not have a value for index '{index}'");
                String::new()
            }
        },
    }
}
