use crate::paths;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use log::LevelFilter;
use note_size_core::{CacheConfig, FormatConfig, LevelsConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

/// Prefix of environment overrides, e.g. `NOTE_SIZE_FORMAT__PRECISION=2`
const ENV_PREFIX: &str = "NOTE_SIZE_";

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub format: FormatConfig,

    #[serde(default)]
    pub levels: LevelsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub collection: CollectionConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset and `--debug` is off
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Where the exported collection and the cache file live
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CollectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Defaults to `<export stem>.media` next to the export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_dir: Option<PathBuf>,

    /// Defaults to the platform data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Check every section; called on each load and before each save
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.format.validate()?;
        self.levels.validate()?;
        LevelFilter::from_str(&self.logging.level)
            .with_context(|| format!("Invalid logging.level '{}'", self.logging.level))?;
        Ok(())
    }

    /// Path of the persisted cache file
    pub fn cache_file(&self) -> PathBuf {
        paths::get_cache_file_path(self.collection.cache_dir.as_deref(), &self.cache.file_name)
    }
}

/// Configuration manager that handles platform paths and layered configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: paths::get_config_path(),
        }
    }

    /// Create a ConfigManager with a specific path (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    /// Defaults < config file < environment
    fn figment(&self) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the effective configuration
    pub fn load(&self) -> Result<AppConfig> {
        let config: AppConfig = self
            .figment()
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Get a configuration value by key (dot notation)
    pub fn get(&self, key: &str) -> Result<String> {
        let value = to_toml_value(&self.load()?)?;

        let mut current = &value;
        for part in key.split('.') {
            match current {
                toml::Value::Table(table) => {
                    current = table
                        .get(part)
                        .ok_or_else(|| anyhow::anyhow!("Key '{}' not found", key))?;
                }
                _ => anyhow::bail!("Invalid key path: {}", key),
            }
        }

        scalar_to_string(current)
            .ok_or_else(|| anyhow::anyhow!("Value at '{}' is not a simple type", key))
    }

    /// Set a configuration value by key (dot notation)
    ///
    /// The key is merged into the file's current contents, the result is
    /// validated as a whole and only the typed fields are written back.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        if parts.iter().any(|part| part.is_empty()) {
            anyhow::bail!("Invalid key: '{}'", key);
        }

        let mut file = self.read_file()?;
        insert_at(&mut file, &parts, parse_config_value(key, value))?;

        let merged = toml::to_string(&file)?;
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(&merged))
            .extract()
            .with_context(|| format!("Invalid value for {key}: '{value}'"))?;
        config.validate()?;

        let typed = to_toml_value(&config)?;
        if lookup(&typed, &parts).is_none() {
            anyhow::bail!("Unknown configuration key: '{}'", key);
        }

        let known: BTreeSet<String> = flatten(&typed).into_iter().map(|(k, _)| k).collect();
        for (stale, _) in flatten(&file) {
            if !known.contains(&stale) {
                log::info!("Dropping unknown configuration key '{stale}'");
            }
        }

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, toml::to_string_pretty(&config)?).with_context(|| {
            format!(
                "Failed to write configuration to {}",
                self.config_path.display()
            )
        })?;

        Ok(())
    }

    /// List all scalar configuration values, sorted by key
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = to_toml_value(&self.load()?)?;
        Ok(flatten(&value))
    }

    fn read_file(&self) -> Result<toml::Value> {
        if !self.config_path.exists() {
            return Ok(toml::Value::Table(toml::map::Map::new()));
        }
        let content = fs::read_to_string(&self.config_path)?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.config_path.display()))
    }
}

fn to_toml_value(config: &AppConfig) -> Result<toml::Value> {
    let toml_string = toml::to_string(config)?;
    Ok(toml::from_str(&toml_string)?)
}

fn scalar_to_string(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten scalar leaves into sorted `(dotted.key, value)` pairs
fn flatten(value: &toml::Value) -> Vec<(String, String)> {
    let mut items = Vec::new();
    collect_values(value, String::new(), &mut items);
    items.sort_by(|a, b| a.0.cmp(&b.0));
    items
}

fn collect_values(value: &toml::Value, prefix: String, items: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_values(val, new_prefix, items);
            }
        }
        // Arrays such as the size levels are edited in the file directly
        toml::Value::Array(_) => {}
        scalar => {
            if let Some(text) = scalar_to_string(scalar) {
                items.push((prefix, text));
            }
        }
    }
}

fn lookup<'a>(value: &'a toml::Value, parts: &[&str]) -> Option<&'a toml::Value> {
    parts
        .iter()
        .try_fold(value, |current, part| current.as_table()?.get(*part))
}

fn insert_at(root: &mut toml::Value, parts: &[&str], value: toml::Value) -> Result<()> {
    let Some((last, parents)) = parts.split_last() else {
        anyhow::bail!("Empty key");
    };

    let mut current = root;
    for part in parents {
        let toml::Value::Table(table) = current else {
            anyhow::bail!("Invalid key path: expected table at '{}'", part);
        };
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    match current {
        toml::Value::Table(table) => {
            table.insert(last.to_string(), value);
            Ok(())
        }
        _ => anyhow::bail!("Cannot set value on non-table"),
    }
}

/// Parse a value to the appropriate TOML type
fn parse_config_value(key: &str, value: &str) -> toml::Value {
    match key {
        // Free-form text even when it looks like a number
        "cache.file_name" | "logging.level" => toml::Value::String(value.to_string()),
        k if k.starts_with("collection.") => toml::Value::String(value.to_string()),
        _ => {
            if let Ok(b) = value.parse::<bool>() {
                toml::Value::Boolean(b)
            } else if let Ok(i) = value.parse::<i64>() {
                toml::Value::Integer(i)
            } else if let Ok(f) = value.parse::<f64>() {
                toml::Value::Float(f)
            } else {
                toml::Value::String(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> ConfigManager {
        ConfigManager::with_path(dir.path().join("config.toml"))
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.logging.level, "warn");
        assert!(config.cache.warmup_enabled);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let config = AppConfig {
            logging: LoggingConfig {
                level: "loud".to_string(),
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_file_honours_cache_dir() {
        let mut config = AppConfig::default();
        config.collection.cache_dir = Some(PathBuf::from("/var/tmp/ns"));
        assert_eq!(
            config.cache_file(),
            PathBuf::from("/var/tmp/ns/note_size_cache.bin")
        );
    }

    #[test]
    fn test_lookup_and_insert_nested() {
        let mut root = toml::Value::Table(toml::map::Map::new());
        insert_at(&mut root, &["a", "b"], toml::Value::Integer(3)).unwrap();
        assert_eq!(lookup(&root, &["a", "b"]), Some(&toml::Value::Integer(3)));
        assert_eq!(lookup(&root, &["a", "c"]), None);
        assert!(insert_at(&mut root, &["a", "b", "c"], toml::Value::Integer(1)).is_err());
    }

    #[test]
    fn test_parse_config_value_types() {
        assert_eq!(
            parse_config_value("cache.warmup_enabled", "false"),
            toml::Value::Boolean(false)
        );
        assert_eq!(
            parse_config_value("format.precision", "2"),
            toml::Value::Integer(2)
        );
        assert_eq!(
            parse_config_value("cache.file_name", "42"),
            toml::Value::String("42".to_string())
        );
    }

    #[test]
    fn test_set_prunes_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let mut manager = manager_in(&dir);
        fs::write(
            manager.get_config_path(),
            "[format]\nprecision = 3\n\n[legacy]\nold_flag = true\n",
        )
        .unwrap();

        manager.set("cache.progress_stride", "25").unwrap();

        let content = fs::read_to_string(manager.get_config_path()).unwrap();
        assert!(!content.contains("legacy"));
        assert!(content.contains("progress_stride = 25"));
        assert!(content.contains("precision = 3"));
    }
}
