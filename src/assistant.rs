//! Assistant proxy: forwards a task plus a free-form prompt to a hosted
//! generative-text model and hands back the reply.
//!
//! The task is context only; nothing here touches the board.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AssistantConfig;
use crate::error::TrackerError;
use crate::types::Task;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub task: Task,
    pub prompt: String,
}

/// Wire shape is either `{"response": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssistantResponse {
    Response { response: String },
    Error { error: String },
}

/// Context prompt sent upstream.
pub fn build_prompt(task: &Task, prompt: &str) -> String {
    let notes = if task.notes.is_empty() {
        "N/A"
    } else {
        task.notes.as_str()
    };
    format!(
        "Here is a task I am working on:\n- Task: {}\n- Notes: {}\n\n\
         Based on this context, please help me with the following request:\n\"{}\"",
        task.text, notes, prompt
    )
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub struct AssistantClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl AssistantClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TrackerError::AssistantConfig("API key is empty".to_string()));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::AssistantConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Build from config, reading the key from the configured environment variable.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, TrackerError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            log::error!("{} environment variable not found", config.api_key_env);
            TrackerError::AssistantConfig(format!("{} is not set", config.api_key_env))
        })?;
        Self::new(
            config.endpoint.clone(),
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// Send the request and return the model's text.
    pub fn ask(&self, request: &AssistantRequest) -> Result<String, TrackerError> {
        if request.prompt.trim().is_empty() {
            return Err(TrackerError::AssistantConfig(
                "Missing task or prompt in request body".to_string(),
            ));
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(&request.task, &request.prompt) }] }]
        });

        log::info!("Assistant request for task {} ({})", request.task.id, self.model);
        let resp = self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                log::warn!("Assistant call failed: {e}");
                TrackerError::ExternalService(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            log::warn!("Assistant returned HTTP {}", status.as_u16());
            return Err(TrackerError::ExternalService(format!("HTTP {}", status.as_u16())));
        }

        let data: Value = resp
            .json()
            .map_err(|e| TrackerError::ExternalService(format!("invalid response: {e}")))?;
        extract_text(&data)
            .ok_or_else(|| TrackerError::ExternalService("response had no text".to_string()))
    }

    /// [`ask`](Self::ask) folded into the wire response shape.
    pub fn handle(&self, request: &AssistantRequest) -> AssistantResponse {
        match self.ask(request) {
            Ok(response) => AssistantResponse::Response { response },
            Err(e) => AssistantResponse::Error {
                error: e.to_string(),
            },
        }
    }
}
