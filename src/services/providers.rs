// AI Provider Service
// Chat-completion, Anthropic messages and local generate endpoints used for explanations

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

use super::config_store::ConfigStore;

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
const GLM_DEFAULT_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const ANTHROPIC_DEFAULT_URL: &str = "https://api.anthropic.com/v1/messages";
pub const LOCAL_DEFAULT_URL: &str = "http://localhost:11434";
pub const LOCAL_DEFAULT_MODEL: &str = "llama3";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const CLIENT_TIMEOUT_SECS: u64 = 80;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("API key not configured for {0}")]
    MissingApiKey(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Hosted providers reachable with an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
    Glm,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::DeepSeek,
        ProviderKind::Glm,
        ProviderKind::Anthropic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Glm => "glm",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::DeepSeek => "deepseek-chat",
            ProviderKind::Glm => "glm-4-flash",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    fn default_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => OPENAI_DEFAULT_URL,
            ProviderKind::DeepSeek => DEEPSEEK_DEFAULT_URL,
            ProviderKind::Glm => GLM_DEFAULT_URL,
            ProviderKind::Anthropic => ANTHROPIC_DEFAULT_URL,
        }
    }

    fn url_env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_URL",
            ProviderKind::DeepSeek => "DEEPSEEK_API_URL",
            ProviderKind::Glm => "GLM_API_URL",
            ProviderKind::Anthropic => "ANTHROPIC_API_URL",
        }
    }

    /// Endpoint precedence: explicit override, `<NAME>_API_URL`, built-in default.
    pub fn endpoint(&self, override_url: Option<&str>) -> String {
        if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        env::var(self.url_env_var())
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.default_url().to_string())
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "glm" | "zhipu" => Ok(ProviderKind::Glm),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub model: String,
}

/// Split `name[:model]`.
pub fn parse_provider(spec: &str) -> ProviderSpec {
    let (name, model) = spec.split_once(':').unwrap_or((spec, ""));
    ProviderSpec {
        name: name.to_string(),
        model: model.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatMessage<'a> {
    fn new(role: &'static str, content: &'a str) -> Self {
        Self { role, content }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        let built = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build();
        Self {
            client: client_or_fallback(built),
        }
    }

    pub fn with_proxy(proxy_url: &str) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;
        Ok(Self { client })
    }

    /// Send one system + user exchange to a hosted provider.
    pub async fn complete(
        &self,
        kind: ProviderKind,
        base_url: Option<&str>,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<ChatResult, ProviderError> {
        let url = kind.endpoint(base_url);
        match kind {
            ProviderKind::Anthropic => {
                self.anthropic_messages(&url, model, api_key, system, user, max_tokens)
                    .await
            }
            ProviderKind::OpenAi | ProviderKind::DeepSeek | ProviderKind::Glm => {
                self.chat_completions(&url, model, api_key, system, user, max_tokens)
                    .await
            }
        }
    }

    /// Ollama-style `/api/generate` on a locally hosted model.
    pub async fn generate_local(
        &self,
        base_url: &str,
        model: &str,
        prompt: &str,
    ) -> Result<ChatResult, ProviderError> {
        #[derive(Serialize)]
        struct GenerateRequest<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            response: Option<String>,
        }

        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let (data, latency_ms): (GenerateResponse, i64) =
            self.post_json(self.client.post(&url), &body).await?;
        let content = non_empty(data.response).ok_or(ProviderError::MissingContent)?;
        Ok(ChatResult { content, latency_ms })
    }

    async fn anthropic_messages(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<ChatResult, ProviderError> {
        #[derive(Serialize)]
        struct MessagesRequest<'a> {
            model: &'a str,
            max_tokens: u32,
            #[serde(skip_serializing_if = "str::is_empty")]
            system: &'a str,
            messages: [ChatMessage<'a>; 1],
        }

        #[derive(Deserialize)]
        struct MessagesResponse {
            content: Option<Vec<ContentBlock>>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            text: Option<String>,
        }

        let body = MessagesRequest {
            model,
            max_tokens,
            system,
            messages: [ChatMessage::new("user", user)],
        };
        let builder = self
            .client
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let (data, latency_ms): (MessagesResponse, i64) = self.post_json(builder, &body).await?;
        let content = non_empty(data.content.into_iter().flatten().find_map(|b| b.text))
            .ok_or(ProviderError::MissingContent)?;
        Ok(ChatResult { content, latency_ms })
    }

    async fn chat_completions(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<ChatResult, ProviderError> {
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage::new("system", system),
                ChatMessage::new("user", user),
            ],
            max_tokens,
            temperature: 0.2,
        };
        let builder = self.client.post(url).bearer_auth(api_key);

        let (data, latency_ms): (ChatResponse, i64) = self.post_json(builder, &body).await?;
        let content = non_empty(
            data.choices
                .into_iter()
                .flatten()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content),
        )
        .ok_or(ProviderError::MissingContent)?;
        Ok(ChatResult { content, latency_ms })
    }

    /// POST a JSON body and decode a JSON reply; non-2xx statuses become `Api` errors.
    async fn post_json<B, R>(
        &self,
        builder: RequestBuilder,
        body: &B,
    ) -> Result<(R, i64), ProviderError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let start = Instant::now();
        let response = builder.json(body).send().await?;
        let latency_ms = start.elapsed().as_millis() as i64;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data = response
            .json::<R>()
            .await
            .map_err(|e| ProviderError::Json(e.to_string()))?;
        Ok((data, latency_ms))
    }
}

/// A builder failure degrades to reqwest's default client, which has no overall timeout.
fn client_or_fallback(built: Result<Client, reqwest::Error>) -> Client {
    match built {
        Ok(client) => client,
        Err(e) => {
            warn!(
                "[PROVIDER] HTTP client build failed: {}, using default client without the {}s timeout",
                e, CLIENT_TIMEOUT_SECS
            );
            Client::new()
        }
    }
}

fn non_empty(content: Option<String>) -> Option<String> {
    content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Environment variables consulted for a provider's key, in order.
pub fn api_key_env_vars(provider: &str) -> Vec<String> {
    let canonical = provider
        .parse::<ProviderKind>()
        .map(|k| k.name().to_string())
        .unwrap_or_else(|_| provider.trim().to_ascii_lowercase());
    let upper = canonical.to_ascii_uppercase().replace('-', "_");
    vec![format!("{}_API_KEY", upper), format!("STYLEGUARD_{}_API_KEY", upper)]
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    for key in api_key_env_vars(provider) {
        if let Ok(val) = env::var(&key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    let store = ConfigStore::open_default().ok()?;
    store.get_api_key(provider).ok().flatten()
}

/// Like [`get_api_key`] but reports a missing key as an error.
pub fn require_api_key(provider: &str) -> Result<String, ProviderError> {
    get_api_key(provider).ok_or_else(|| ProviderError::MissingApiKey(provider.to_string()))
}
