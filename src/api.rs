// API Commands
// Transport-independent entry points used by the command-line front end

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::models::{AnalyzeRequest, AnalyzeResponse, HealthResponse};
use crate::services::analysis::Analyzer;
use crate::services::config_store::{AppConfig, ConfigStore};
use crate::services::document_loader::extract_text;
use crate::services::providers::{api_key_env_vars, ProviderKind};

/// Error body returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(e: &AnalysisError) -> Self {
        Self {
            code: e.code().to_string(),
            message: e.to_string(),
        }
    }
}

/// Static liveness probe.
pub fn health_check() -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
    }
}

pub async fn analyze_text(
    analyzer: &Analyzer,
    request: AnalyzeRequest,
) -> Result<AnalyzeResponse, AnalysisError> {
    analyzer.analyze(request).await
}

/// Extract plain text from an uploaded file.
pub async fn preprocess_file(file_name: String, bytes: Vec<u8>) -> Result<String, String> {
    let size = bytes.len();
    let name = file_name.clone();
    let text = tokio::task::spawn_blocking(move || extract_text(&name, &bytes))
        .await
        .map_err(|e| format!("extraction task failed: {}", e))?
        .map_err(|e| e.to_string())?;
    info!(
        file = %file_name,
        bytes = size,
        chars = text.chars().count(),
        "document.extracted"
    );
    Ok(text)
}

fn open_store() -> Result<ConfigStore, String> {
    ConfigStore::open_default().map_err(|e| e.to_string())
}

pub fn get_config() -> Result<AppConfig, String> {
    open_store()?.load().map_err(|e| e.to_string())
}

pub fn save_config(config: AppConfig) -> Result<(), String> {
    open_store()?.save(&config).map_err(|e| e.to_string())
}

/// Load the saved configuration, falling back to defaults when it is unreadable.
pub fn load_config_or_default() -> AppConfig {
    match get_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config unavailable ({}), using defaults", e);
            AppConfig::default()
        }
    }
}

pub fn store_api_key(provider: String, key: String) -> Result<(), String> {
    let provider = canonical_provider(&provider)?;
    if key.trim().is_empty() {
        return Err("API key is empty".to_string());
    }
    open_store()?
        .set_api_key(provider.name(), &key)
        .map_err(|e| e.to_string())?;
    info!("Stored API key for {}", provider);
    Ok(())
}

pub fn delete_api_key(provider: String) -> Result<bool, String> {
    let provider = canonical_provider(&provider)?;
    open_store()?
        .delete_api_key(provider.name())
        .map_err(|e| e.to_string())
}

fn canonical_provider(provider: &str) -> Result<ProviderKind, String> {
    provider.parse::<ProviderKind>().map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Environment,
    ConfigFile,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyStatus {
    pub provider: String,
    pub source: KeySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<String>,
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Where each provider's key would be taken from, with the key masked.
pub fn api_key_statuses(config: &AppConfig) -> Vec<ApiKeyStatus> {
    ProviderKind::ALL
        .iter()
        .map(|kind| {
            let from_env = api_key_env_vars(kind.name())
                .into_iter()
                .filter_map(|var| env::var(var).ok())
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty());
            let from_file = config
                .api_keys
                .get(kind.name())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());

            let (source, masked) = match (from_env, from_file) {
                (Some(k), _) => (KeySource::Environment, Some(mask_key(&k))),
                (None, Some(k)) => (KeySource::ConfigFile, Some(mask_key(&k))),
                (None, None) => (KeySource::Missing, None),
            };
            ApiKeyStatus {
                provider: kind.name().to_string(),
                source,
                masked,
            }
        })
        .collect()
}

/// Configuration with stored keys replaced by their masked form.
pub fn redacted_config(config: &AppConfig) -> AppConfig {
    let mut cfg = config.clone();
    for value in cfg.api_keys.values_mut() {
        *value = mask_key(value);
    }
    cfg
}
