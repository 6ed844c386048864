//! Ollama-compatible local LLM client

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const HOST_ENV_VAR: &str = "OLLAMA_HOST";

/// Preferred models, best first
pub const PRIORITY_MODELS: [&str; 4] = [
    "deepseek-v3.1:671b-cloud",
    "qwen3-coder:480b-cloud",
    "llama3.2:1b",
    "mistral",
];
/// Used when the server lists no models
pub const FALLBACK_MODEL: &str = "mistral";

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);
const PING_TIMEOUT: Duration = Duration::from_secs(5);
const CHAT_TIMEOUT: Duration = Duration::from_secs(120);
const STARTUP_POLLS: u32 = 10;
const STARTUP_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant for a YouTube automation system.";

/// LLM client errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Could not connect to Ollama at {0}. Is it running?")]
    Unreachable(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

/// Pick the first priority model that is installed and answers, else the first installed
fn choose_model(available: &[String], responsive: impl Fn(&str) -> bool) -> String {
    if available.is_empty() {
        return FALLBACK_MODEL.to_string();
    }
    PRIORITY_MODELS
        .iter()
        .find(|preferred| available.iter().any(|m| m == **preferred) && responsive(preferred))
        .map(|m| m.to_string())
        .unwrap_or_else(|| available[0].clone())
}

/// Ollama API client
pub struct OllamaClient {
    http_client: reqwest::Client,
    host: String,
    active_model: OnceCell<String>,
}

impl OllamaClient {
    pub fn new(host: &str) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;
        Ok(Self {
            http_client,
            host: host.trim_end_matches('/').to_string(),
            active_model: OnceCell::new(),
        })
    }

    /// Host from `OLLAMA_HOST`, else localhost
    pub fn from_env() -> Result<Self, LlmError> {
        let host = std::env::var(HOST_ENV_VAR)
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map(|h| {
                if h.starts_with("http://") || h.starts_with("https://") {
                    h
                } else {
                    format!("http://{}", h)
                }
            })
            .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
        Self::new(&host)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// True when `/api/tags` answers 200 within two seconds
    pub async fn is_available(&self) -> bool {
        self.http_client
            .get(format!("{}/api/tags", self.host))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Installed model names; empty when unreachable
    pub async fn list_models(&self) -> Vec<String> {
        let response = match self
            .http_client
            .get(format!("{}/api/tags", self.host))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(status = r.status().as_u16(), "Model list unavailable");
                return Vec::new();
            }
            Err(e) => {
                debug!("Model list unavailable: {}", e);
                return Vec::new();
            }
        };
        response
            .json::<TagsResponse>()
            .await
            .map(|tags| tags.models.into_iter().map(|m| m.name).collect())
            .unwrap_or_default()
    }

    async fn ping(&self, model: &str) -> bool {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage { role: "user", content: "ping" }],
            stream: false,
            options: None,
            format: None,
        };
        self.http_client
            .post(format!("{}/api/chat", self.host))
            .timeout(PING_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Best available model, chosen once per client
    pub async fn best_model(&self) -> String {
        self.active_model
            .get_or_init(|| async {
                let available = self.list_models().await;
                let mut picked = None;
                for preferred in PRIORITY_MODELS {
                    if available.iter().any(|m| m == preferred) && self.ping(preferred).await {
                        picked = Some(preferred);
                        break;
                    }
                }
                let model = choose_model(&available, |m| picked.is_some_and(|p| p == m));
                info!(model = %model, "Selected LLM model");
                model
            })
            .await
            .clone()
    }

    /// Non-streaming chat; `json_mode` asks the server for a JSON object
    pub async fn chat(
        &self,
        prompt: &str,
        system: &str,
        model: Option<&str>,
        temperature: f32,
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let model = match model {
            Some(m) => m.to_string(),
            None => self.best_model().await,
        };
        let request = ChatRequest {
            model: &model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            stream: false,
            options: Some(ChatOptions { temperature }),
            format: json_mode.then_some("json"),
        };

        let response = self
            .http_client
            .post(format!("{}/api/chat", self.host))
            .timeout(CHAT_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Unreachable(self.host.clone())
                } else {
                    LlmError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(status.as_u16(), error_text));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;
        Ok(reply.message.map(|m| m.content).unwrap_or_default())
    }

    /// Make sure the server answers, spawning `ollama serve` when `autostart` is on
    pub async fn ensure_running(&self, autostart: bool) -> bool {
        if self.is_available().await {
            return true;
        }
        if !autostart {
            warn!("Ollama not running (auto-start disabled in config)");
            return false;
        }

        info!("Ollama not running, starting `ollama serve`");
        if let Err(e) = tokio::process::Command::new("ollama")
            .arg("serve")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            warn!("Failed to start Ollama: {}", e);
            return false;
        }

        for attempt in 1..=STARTUP_POLLS {
            tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
            if self.is_available().await {
                info!("Ollama started");
                return true;
            }
            debug!("Waiting for Ollama ({}/{})", attempt, STARTUP_POLLS);
        }
        warn!("Ollama failed to start within {}s", STARTUP_POLLS);
        false
    }
}
