//! Configuration loading and management
//!
//! Layers, lowest first: built-in defaults, `config.json` in the config
//! directory, the `OLLAMA_*` aliases, then `TRIAGE_CHAT__SECTION__FIELD`
//! variables.

use super::schema::Config;
use super::validate::validate_config;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "TRIAGE_CHAT__";

/// Conventional variable names understood by other Ollama tooling
const ENV_ALIASES: &[(&str, &[&str])] = &[
    ("OLLAMA_BASE_URL", &["model", "api_base"]),
    ("OLLAMA_MODEL", &["model", "model"]),
];

/// Configuration loader
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with the default config directory
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .map(|h| h.join(".triage-chat"))
            .unwrap_or_else(|| PathBuf::from(".triage-chat"));

        Self { config_dir }
    }

    /// Create a new config loader with a custom config directory
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file and the process environment
    pub fn load(&self) -> crate::Result<Config> {
        self.load_with_env(std::env::vars())
    }

    /// Load configuration using the given environment variables
    pub fn load_with_env<I>(&self, vars: I) -> crate::Result<Config>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut merged = serde_json::to_value(Config::default())?;

        let config_path = self.config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let file_value: Value = serde_json::from_str(&content).map_err(|e| {
                crate::Error::Config(format!("{}: {}", config_path.display(), e))
            })?;
            overlay(&mut merged, file_value);
        }

        for (path, value) in env_overrides(vars) {
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            set_at(&mut merged, &path, value);
        }

        let config: Config = serde_json::from_value(merged)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Config) -> crate::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively lay `top` over `base`; objects merge, anything else replaces
fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base), Value::Object(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn set_at(node: &mut Value, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        set_at(child, rest, value);
    }
}

/// Collect overrides in application order: aliases first, then prefixed
/// paths, so a prefixed variable wins over its alias.
fn env_overrides<I>(vars: I) -> Vec<(Vec<String>, Value)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut aliases = Vec::new();
    let mut paths = Vec::new();

    for (key, raw) in vars {
        if let Some((_, path)) = ENV_ALIASES.iter().find(|(name, _)| *name == key) {
            let path = path.iter().map(|s| s.to_string()).collect();
            aliases.push((path, Value::String(raw)));
        } else if let Some(suffix) = key.strip_prefix(ENV_PREFIX) {
            let path: Vec<String> = suffix
                .split("__")
                .filter(|s| !s.is_empty())
                .map(str::to_ascii_lowercase)
                .collect();
            if !path.is_empty() {
                paths.push((path, env_scalar(&raw)));
            }
        }
    }

    aliases.extend(paths);
    aliases
}

/// Interpret a variable as JSON when it parses, otherwise as a string
fn env_scalar(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(dir: &TempDir, pairs: &[(&str, &str)]) -> crate::Result<Config> {
        ConfigLoader::with_dir(dir.path()).load_with_env(env(pairs))
    }

    #[test]
    fn test_load_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = load(&temp_dir, &[]).unwrap();

        assert_eq!(config.model.model, "llama3");
        assert_eq!(config.model.api_base, "http://localhost:11434");
        assert_eq!(config.session.context_limit, 8);
        assert_eq!(config.session.key, "symptom_chat_v1");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_dir(temp_dir.path());

        let mut config = Config::default();
        config.model.model = "mistral".to_string();
        config.session.context_limit = 4;

        loader.save(&config).unwrap();
        let loaded = loader.load_with_env(Vec::new()).unwrap();

        assert_eq!(loaded.model.model, "mistral");
        assert_eq!(loaded.session.context_limit, 4);
    }

    #[test]
    fn test_alias_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let config = load(
            &temp_dir,
            &[
                ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
                ("OLLAMA_MODEL", "llama3.1"),
            ],
        )
        .unwrap();

        assert_eq!(config.model.api_base, "http://gpu-box:11434");
        assert_eq!(config.model.model, "llama3.1");
    }

    #[test]
    fn test_path_overrides_are_typed() {
        let temp_dir = TempDir::new().unwrap();
        let config = load(
            &temp_dir,
            &[
                ("TRIAGE_CHAT__MODEL__TEMPERATURE", "0.5"),
                ("TRIAGE_CHAT__SESSION__CONTEXT_LIMIT", "12"),
                ("TRIAGE_CHAT__MODEL__JSON_FORMAT", "False"),
                ("TRIAGE_CHAT__SERVER__PORT", "8088"),
                ("TRIAGE_CHAT__SESSION__KEY", "ward_7"),
            ],
        )
        .unwrap();

        assert!((config.model.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.session.context_limit, 12);
        assert!(!config.model.json_format);
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.session.key, "ward_7");
    }

    #[test]
    fn test_path_override_beats_alias_and_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"model":{"model":"from-file"}}"#,
        )
        .unwrap();

        // path variable listed first to show order of iteration does not matter
        let config = load(
            &temp_dir,
            &[
                ("TRIAGE_CHAT__MODEL__MODEL", "from-path"),
                ("OLLAMA_MODEL", "from-alias"),
            ],
        )
        .unwrap();
        assert_eq!(config.model.model, "from-path");
    }

    #[test]
    fn test_file_values_merge_over_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"session":{"key":"ward_7"}}"#,
        )
        .unwrap();

        let config = load(&temp_dir, &[]).unwrap();
        assert_eq!(config.session.key, "ward_7");
        assert_eq!(config.session.context_limit, 8);
        assert_eq!(config.model.model, "llama3");
    }

    #[test]
    fn test_unrelated_variables_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let config = load(&temp_dir, &[("PATH", "/usr/bin"), ("TRIAGE_CHAT__", "x")]).unwrap();
        assert_eq!(config.model.model, "llama3");
    }

    #[test]
    fn test_validation_rejects_invalid_temperature() {
        let temp_dir = TempDir::new().unwrap();
        let err = load(&temp_dir, &[("TRIAGE_CHAT__MODEL__TEMPERATURE", "2.5")]).unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_unparsable_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("config.json"), "{ not json").unwrap();

        let err = load(&temp_dir, &[]).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_env_scalar() {
        assert_eq!(env_scalar("TRUE"), Value::Bool(true));
        assert_eq!(env_scalar("42"), Value::from(42));
        assert_eq!(env_scalar("llama3"), Value::String("llama3".to_string()));
    }
}
