use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::SynthConfig;
use super::validation::validate_config;
use crate::core::errors::SetupError;

/// Credential variables per `(section, provider)`. They take precedence over
/// `secrets.yaml`. A provider missing from the table takes no credential from
/// the environment.
const CREDENTIAL_ENV: [(&str, &str, &str); 3] = [
    ("embedding", "cohere", "COHERE_API_KEY"),
    ("embedding", "openai_compatible", "OPENAI_API_KEY"),
    ("generation", "openai_compatible", "OPENAI_API_KEY"),
];

/// Provider assumed when a section does not name one.
const DEFAULT_PROVIDERS: [(&str, &str); 2] = [("embedding", "cohere"), ("generation", "ollama")];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
    explicit_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self {
            paths,
            explicit_path: None,
        }
    }

    /// Use `path` instead of the discovered `config.yml`.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.explicit_path {
            return path.clone();
        }

        if let Ok(path) = env::var("MEDQA_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged raw document: `config.yml` overlaid with `secrets.yaml`.
    pub fn load_config(&self) -> Result<Value, SetupError> {
        let config_path = self.config_path();
        if self.explicit_path.is_some() && !config_path.exists() {
            return Err(SetupError::MissingInput(config_path));
        }

        let public_config = load_yaml_file(&config_path)?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        Ok(deep_merge(&public_config, &secrets_config))
    }

    pub fn load_settings(&self) -> Result<SynthConfig, SetupError> {
        let mut merged = self.load_config()?;
        apply_env_credentials(&mut merged);
        validate_config(&merged)?;

        let config_path = self.config_path();
        serde_json::from_value(merged).map_err(|err| SetupError::json(config_path, err))
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, SetupError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|err| SetupError::io(path, err))?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value = serde_yaml::from_str::<Value>(&contents)
        .map_err(|err| SetupError::Config(format!("{}: {}", path.display(), err)))?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(SetupError::Config(format!(
            "{}: top level must be a mapping",
            path.display()
        ))),
    }
}

fn apply_env_credentials(config: &mut Value) {
    apply_credentials_from(config, |var| env::var(var).ok());
}

fn configured_provider(config: &Value, section: &str) -> String {
    config
        .get(section)
        .and_then(|s| s.get("provider"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            DEFAULT_PROVIDERS
                .iter()
                .find(|(name, _)| *name == section)
                .map(|(_, provider)| provider.to_string())
        })
        .unwrap_or_default()
}

fn apply_credentials_from<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (section, provider, var) in CREDENTIAL_ENV {
        if configured_provider(config, section) != provider {
            continue;
        }
        let Some(secret) = lookup(var).filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        set_nested(config, section, "api_key", Value::String(secret));
    }

    if let Some(host) = lookup("OLLAMA_HOST") {
        let has_url = config
            .get("generation")
            .and_then(|g| g.get("base_url"))
            .is_some_and(|v| v.is_string());
        if !has_url && !host.trim().is_empty() {
            set_nested(config, "generation", "base_url", Value::String(host));
        }
    }
}

fn set_nested(config: &mut Value, section: &str, key: &str, value: Value) {
    let Some(root) = config.as_object_mut() else {
        return;
    };
    let entry = root
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(map) = entry.as_object_mut() {
        map.insert(key.to_string(), value);
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::rag::Metric;

    fn service_in(dir: &Path) -> ConfigService {
        let paths = AppPaths::with_dirs(dir.to_path_buf(), dir.join("data"));
        ConfigService::new(Arc::new(paths))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({ "a": 1, "b": { "c": 2, "d": 3 } });
        let over = json!({ "b": { "d": 4, "e": 5 }, "f": 6 });

        let merged = deep_merge(&base, &over);
        assert_eq!(merged, json!({ "a": 1, "b": { "c": 2, "d": 4, "e": 5 }, "f": 6 }));
    }

    #[test]
    fn secrets_overlay_public_config() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        fs::write(
            dir.path().join("config.yml"),
            "retrieval:\n  metric: cosine\n  top_k: 7\nembedding:\n  model: embed-english-v3.0\n",
        )
        .unwrap();
        fs::write(service.secrets_path(), "embedding:\n  api_key: from-secrets\n").unwrap();

        let merged = service.load_config().unwrap();
        assert_eq!(merged["embedding"]["api_key"], "from-secrets");
        assert_eq!(merged["embedding"]["model"], "embed-english-v3.0");

        let settings: SynthConfig = serde_json::from_value(merged).unwrap();
        assert_eq!(settings.retrieval.metric, Some(Metric::Cosine));
        assert_eq!(settings.retrieval.top_k, 7);
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path());
        let merged = service.load_config().unwrap();
        assert_eq!(merged, json!({}));
    }

    #[test]
    fn explicit_missing_config_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path()).with_config_path(Some(dir.path().join("nope.yml")));
        assert!(matches!(
            service.load_config(),
            Err(SetupError::MissingInput(_))
        ));
    }

    fn fake_env(var: &str) -> Option<String> {
        match var {
            "COHERE_API_KEY" => Some("cohere-key".to_string()),
            "OPENAI_API_KEY" => Some("openai-key".to_string()),
            _ => None,
        }
    }

    #[test]
    fn credentials_follow_configured_provider() {
        let mut defaults = json!({});
        apply_credentials_from(&mut defaults, fake_env);
        assert_eq!(defaults["embedding"]["api_key"], "cohere-key");
        assert!(defaults.get("generation").is_none());

        let mut openai = json!({
            "embedding": { "provider": "openai_compatible" },
            "generation": { "provider": "openai_compatible" }
        });
        apply_credentials_from(&mut openai, fake_env);
        assert_eq!(openai["embedding"]["api_key"], "openai-key");
        assert_eq!(openai["generation"]["api_key"], "openai-key");
    }

    #[test]
    fn blank_env_credential_keeps_secrets_value() {
        let mut config = json!({ "embedding": { "api_key": "from-secrets" } });
        apply_credentials_from(&mut config, |var| {
            (var == "COHERE_API_KEY").then(|| "  ".to_string())
        });
        assert_eq!(config["embedding"]["api_key"], "from-secrets");
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "- just\n- a list\n").unwrap();
        let service = service_in(dir.path()).with_config_path(Some(path));
        assert!(matches!(service.load_config(), Err(SetupError::Config(_))));
    }
}
