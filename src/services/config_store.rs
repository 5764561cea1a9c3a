// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use super::analysis::TaggerKind;

pub const CONFIG_VERSION: &str = "1";
/// Fewest words an accepted document may have.
pub const MIN_WORDS_FLOOR: usize = 100;
/// Fewest segments the cross-segment statistics are computed over.
pub const MIN_SEGMENTS_FLOOR: usize = 3;
const BACKUPS_TO_KEEP: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("No config directory available on this platform")]
    NoConfigDir,
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
    let path = path.to_path_buf();
    move |source| ConfigError::Io { action, path, source }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub explanation: ExplanationConfig,
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            analysis: AnalysisConfig::default(),
            explanation: ExplanationConfig::default(),
            proxy: None,
            providers: HashMap::new(),
            api_keys: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Proxy URL to route provider traffic through, when enabled.
    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy
            .as_ref()
            .filter(|p| p.enabled)
            .and_then(|p| p.https.as_deref().or(p.http.as_deref()))
    }

    /// Explanation settings with model and endpoint filled from the
    /// matching `providers` entry when not set explicitly.
    pub fn effective_explanation(&self) -> ExplanationConfig {
        let mut cfg = self.explanation.clone();
        if let Some(provider) = self.providers.get(&cfg.provider).filter(|p| p.enabled) {
            if cfg.model.is_none() {
                cfg.model = provider.model.clone();
            }
            if cfg.base_url.is_none() {
                cfg.base_url = provider.base_url.clone();
            }
        }
        cfg
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub enabled: bool,
    pub http: Option<String>,
    pub https: Option<String>,
}

// ============ Analysis ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,
    #[serde(default = "default_min_segment_words")]
    pub min_segment_words: usize,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_min_segments")]
    pub min_segments: usize,
    #[serde(default)]
    pub pos_tagger: TaggerKind,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            segment_size: default_segment_size(),
            min_segment_words: default_min_segment_words(),
            min_words: default_min_words(),
            min_segments: default_min_segments(),
            pos_tagger: TaggerKind::default(),
        }
    }
}

impl AnalysisConfig {
    /// Word-count gate; config may raise it but never go below the floor.
    pub fn required_words(&self) -> usize {
        self.min_words.max(MIN_WORDS_FLOOR)
    }

    /// Segment-count gate; config may raise it but never go below the floor.
    pub fn required_segments(&self) -> usize {
        self.min_segments.max(MIN_SEGMENTS_FLOOR)
    }
}

// ============ Explanation ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationStrategy {
    #[default]
    RuleBased,
    Api,
    Local,
}

impl ExplanationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationStrategy::RuleBased => "rule_based",
            ExplanationStrategy::Api => "api",
            ExplanationStrategy::Local => "local",
        }
    }
}

impl fmt::Display for ExplanationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExplanationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "rule_based" | "rules" => Ok(ExplanationStrategy::RuleBased),
            "api" => Ok(ExplanationStrategy::Api),
            "local" => Ok(ExplanationStrategy::Local),
            other => Err(format!("unknown explanation strategy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationConfig {
    #[serde(default)]
    pub strategy: ExplanationStrategy,
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            strategy: ExplanationStrategy::default(),
            provider: default_provider(),
            model: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ExplanationConfig {
    /// Provider attempts per explanation: one call plus at most one retry.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.clamp(1, 2)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub enabled: bool,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

fn default_version() -> String { CONFIG_VERSION.to_string() }
fn default_segment_size() -> usize { 200 }
fn default_min_segment_words() -> usize { 50 }
fn default_min_words() -> usize { MIN_WORDS_FLOOR }
fn default_min_segments() -> usize { MIN_SEGMENTS_FLOOR }
fn default_provider() -> String { "openai".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_max_attempts() -> u32 { 2 }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Store rooted at the platform config directory.
    pub fn open_default() -> Result<Self, ConfigError> {
        Self::default_config_dir()
            .map(Self::new)
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("styleguard"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(io_err("create", &self.config_dir))
    }

    /// Load configuration; a missing file yields defaults.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content =
            fs::read_to_string(&self.config_file).map_err(io_err("read", &self.config_file))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration, backing up the previous file first.
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_file, content).map_err(io_err("write", &self.config_file))
    }

    fn backup_dir(&self) -> PathBuf {
        self.config_dir.join("backups")
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir).map_err(io_err("create", &backup_dir))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file).map_err(io_err("back up", &backup_file))?;

        self.cleanup_old_backups(&backup_dir, BACKUPS_TO_KEEP)
    }

    /// Remove old backups, keeping only the most recent `keep`.
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)
            .map_err(io_err("read", backup_dir))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Timestamped names sort oldest first
        entries.sort_by_key(|e| e.file_name());

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    pub fn get_api_key(&self, provider: &str) -> Result<Option<String>, ConfigError> {
        let config = self.load()?;
        Ok(config
            .api_keys
            .get(provider)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()))
    }

    pub fn set_api_key(&self, provider: &str, key: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.insert(provider.to_string(), key.trim().to_string());
        self.save(&config)
    }

    pub fn delete_api_key(&self, provider: &str) -> Result<bool, ConfigError> {
        let mut config = self.load()?;
        let removed = config.api_keys.remove(provider).is_some();
        if removed {
            self.save(&config)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.analysis.segment_size, 200);
        assert_eq!(config.analysis.min_segment_words, 50);
        assert_eq!(config.analysis.min_words, 100);
        assert_eq!(config.analysis.min_segments, 3);
        assert_eq!(config.analysis.pos_tagger, TaggerKind::Lexicon);
        assert_eq!(config.explanation.strategy, ExplanationStrategy::RuleBased);
        assert_eq!(config.explanation.timeout_secs, 30);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"explanation":{"strategy":"api","provider":"deepseek"}}"#)
                .unwrap();
        assert_eq!(parsed.explanation.strategy, ExplanationStrategy::Api);
        assert_eq!(parsed.explanation.provider, "deepseek");
        assert_eq!(parsed.explanation.max_attempts, 2);
        assert_eq!(parsed.analysis.segment_size, 200);
        assert_eq!(parsed.version, CONFIG_VERSION);
    }

    #[test]
    fn test_attempts_clamped() {
        let mut cfg = ExplanationConfig::default();
        cfg.max_attempts = 0;
        assert_eq!(cfg.attempts(), 1);
        cfg.max_attempts = 5;
        assert_eq!(cfg.attempts(), 2);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("rule-based".parse::<ExplanationStrategy>(), Ok(ExplanationStrategy::RuleBased));
        assert_eq!("API".parse::<ExplanationStrategy>(), Ok(ExplanationStrategy::Api));
        assert_eq!("local".parse::<ExplanationStrategy>(), Ok(ExplanationStrategy::Local));
        assert!("remote".parse::<ExplanationStrategy>().is_err());
    }

    #[test]
    fn test_proxy_url_only_when_enabled() {
        let mut config = AppConfig::default();
        assert_eq!(config.proxy_url(), None);
        config.proxy = Some(ProxyConfig {
            enabled: false,
            http: Some("http://127.0.0.1:8080".to_string()),
            https: None,
        });
        assert_eq!(config.proxy_url(), None);
        config.proxy.as_mut().unwrap().enabled = true;
        assert_eq!(config.proxy_url(), Some("http://127.0.0.1:8080"));
    }

    #[test]
    fn test_effective_explanation_uses_enabled_provider_entry() {
        let mut config = AppConfig::default();
        config.explanation.provider = "glm".to_string();
        config.providers.insert(
            "glm".to_string(),
            ProviderConfig {
                enabled: true,
                model: Some("glm-4-plus".to_string()),
                base_url: Some("http://gateway.local/v4/chat".to_string()),
            },
        );
        let effective = config.effective_explanation();
        assert_eq!(effective.model.as_deref(), Some("glm-4-plus"));
        assert_eq!(effective.base_url.as_deref(), Some("http://gateway.local/v4/chat"));

        config.explanation.model = Some("glm-4-flash".to_string());
        config.providers.get_mut("glm").unwrap().enabled = false;
        let effective = config.effective_explanation();
        assert_eq!(effective.model.as_deref(), Some("glm-4-flash"));
        assert_eq!(effective.base_url, None);
    }

    #[test]
    fn test_api_key_roundtrip_in_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        assert_eq!(store.get_api_key("openai").unwrap(), None);
        store.set_api_key("openai", "  sk-test  ").unwrap();
        assert_eq!(store.get_api_key("openai").unwrap(), Some("sk-test".to_string()));
        assert!(store.config_file().exists());

        assert!(store.delete_api_key("openai").unwrap());
        assert!(!store.delete_api_key("openai").unwrap());
        assert_eq!(store.get_api_key("openai").unwrap(), None);
    }

    #[test]
    fn test_backups_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        let backups = dir.path().join("backups");
        fs::create_dir_all(&backups).unwrap();
        for i in 0..15 {
            fs::write(backups.join(format!("config_2024010{:02}.json", i)), "{}").unwrap();
        }

        store.cleanup_old_backups(&backups, 10).unwrap();
        let mut left: Vec<String> = fs::read_dir(&backups)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left.len(), 10);
        assert_eq!(left[0], "config_202401005.json");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        store.ensure_dir().unwrap();
        fs::write(store.config_file(), "not json").unwrap();
        assert!(matches!(store.load(), Err(ConfigError::Parse(_))));
    }
}
