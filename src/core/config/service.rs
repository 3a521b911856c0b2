use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::AssistantError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["concise_max_tokens", "detailed_max_tokens", "max_tokens"];

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Text,
    Integer,
}

/// Environment variables recognized on top of the YAML files.
const ENV_OVERRIDES: [(&str, &[&str], EnvKind); 11] = [
    ("GOOGLE_API_KEY", &["credentials", "google_api_key"], EnvKind::Text),
    ("OPENAI_API_KEY", &["credentials", "openai_api_key"], EnvKind::Text),
    ("GROQ_API_KEY", &["credentials", "groq_api_key"], EnvKind::Text),
    ("SERPER_API_KEY", &["credentials", "serper_api_key"], EnvKind::Text),
    ("LLM_PROVIDER", &["llm", "default_provider"], EnvKind::Text),
    ("CHUNK_SIZE", &["rag", "chunk_size"], EnvKind::Integer),
    ("CHUNK_OVERLAP", &["rag", "chunk_overlap"], EnvKind::Integer),
    ("MAX_RETRIEVED_DOCS", &["rag", "max_retrieved_docs"], EnvKind::Integer),
    ("MAX_SEARCH_RESULTS", &["search", "max_search_results"], EnvKind::Integer),
    ("CONCISE_MAX_TOKENS", &["response", "concise_max_tokens"], EnvKind::Integer),
    ("DETAILED_MAX_TOKENS", &["response", "detailed_max_tokens"], EnvKind::Integer),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("STUDY_COMPANION_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged raw document: `config.yml` < `secrets.yaml` < environment.
    pub fn load_config(&self) -> Value {
        self.load_config_with(|key| env::var(key).ok())
    }

    pub fn load_config_with<F>(&self, lookup: F) -> Value
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, lookup);
        merged
    }

    /// Validated, typed configuration.
    pub fn load(&self) -> Result<AppConfig, AssistantError> {
        parse_config(&self.load_config())
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

pub fn parse_config(raw: &Value) -> Result<AppConfig, AssistantError> {
    validate_config(raw)?;
    serde_json::from_value(raw.clone())
        .map_err(|e| AssistantError::config(format!("Failed to parse configuration: {e}")))
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value) => match value {
                Value::Object(_) => value,
                _ => Value::Object(Map::new()),
            },
            Err(err) => {
                tracing::warn!("Ignoring unreadable config file {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(_) => Value::Object(Map::new()),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (name, path, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(name) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = match kind {
            EnvKind::Text => Value::String(raw.to_string()),
            // Unparseable numbers are kept as text so validation reports them.
            EnvKind::Integer => raw
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
        };
        ensure_object_path(config, path, value);
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() && !val.is_object() {
                    let is_blank = val.as_str().map(|s| s.is_empty()).unwrap_or(false);
                    let replacement = if is_blank {
                        val.clone()
                    } else {
                        Value::String(REDACT_PLACEHOLDER.to_string())
                    };
                    redacted.insert(key.clone(), replacement);
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn service_in(dir: &Path) -> ConfigService {
        let paths = AppPaths::from_data_dir(dir.to_path_buf(), dir.to_path_buf());
        ConfigService::new(Arc::new(paths))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn env_overrides_win_over_yaml_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("config.yml"),
            "rag:\n  chunk_size: 800\n  chunk_overlap: 100\n",
        )
        .expect("write config");
        fs::write(
            dir.path().join("secrets.yaml"),
            "credentials:\n  google_api_key: from-file\n",
        )
        .expect("write secrets");

        let env: HashMap<&str, &str> =
            HashMap::from([("CHUNK_SIZE", "1200"), ("SERPER_API_KEY", "serper-key")]);
        let service = service_in(dir.path());
        let raw = service.load_config_with(|key| env.get(key).map(|v| v.to_string()));
        let config = parse_config(&raw).expect("valid config");

        assert_eq!(config.rag.chunk_size, 1200);
        assert_eq!(config.rag.chunk_overlap, 100);
        assert_eq!(config.credentials.google_api_key, "from-file");
        assert_eq!(config.credentials.serper_api_key, "serper-key");
        assert_eq!(config.rag.max_retrieved_docs, 4);
    }

    #[test]
    fn unparseable_numeric_env_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service_in(dir.path());
        let raw = service.load_config_with(|key| {
            (key == "MAX_SEARCH_RESULTS").then(|| "five".to_string())
        });

        let err = parse_config(&raw).unwrap_err();
        assert!(matches!(err, AssistantError::Config(msg) if msg.contains("max_search_results")));
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "credentials": {
                "google_api_key": "secret",
                "serper_api_key": ""
            },
            "response": { "concise_max_tokens": 150 }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "credentials": {
                    "google_api_key": "****",
                    "serper_api_key": ""
                },
                "response": { "concise_max_tokens": 150 }
            })
        );
    }
}
