//! Best-effort AI analysis of a task description.
//!
//! An analyzer returns `None` whenever it cannot produce a result; callers
//! must leave their data untouched in that case.

use crate::config::AnalyzerConfig;
use crate::errors::AnalyzerError;
use crate::models::Priority;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub motivation: String,
    pub priority_suggestion: Priority,
    pub steps: Vec<String>,
}

#[async_trait]
pub trait TaskAnalyzer: Send + Sync {
    async fn analyze(&self, task_text: &str) -> Option<AiAnalysis>;
}

/// Used when no API key is configured.
pub struct DisabledAnalyzer;

#[async_trait]
impl TaskAnalyzer for DisabledAnalyzer {
    async fn analyze(&self, _task_text: &str) -> Option<AiAnalysis> {
        debug!("analyzer disabled, skipping breakdown");
        None
    }
}

/// Google Gemini `generateContent` client constrained to a JSON schema.
pub struct GeminiAnalyzer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAnalyzer {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn request(&self, task_text: &str) -> Result<AiAnalysis, AnalyzerError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(task_text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

#[async_trait]
impl TaskAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, task_text: &str) -> Option<AiAnalysis> {
        match self.request(task_text).await {
            Ok(analysis) => Some(analysis),
            Err(err) => {
                warn!("task analysis unavailable: {err}");
                None
            }
        }
    }
}

pub fn from_config(config: &AnalyzerConfig) -> Arc<dyn TaskAnalyzer> {
    let Some(key) = &config.api_key else {
        return Arc::new(DisabledAnalyzer);
    };
    Arc::new(GeminiAnalyzer::new(
        key.clone(),
        config.model.clone(),
        config.base_url.clone(),
    ))
}

fn prompt(task_text: &str) -> String {
    format!(
        "Analyze this task: \"{task_text}\". As a productivity expert, suggest a priority \
         (LOW, MEDIUM, HIGH) and split it into at most 5 clear sub-steps. \
         Also give a short motivational sentence."
    )
}

fn request_body(task_text: &str) -> serde_json::Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt(task_text) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "motivation": { "type": "STRING" },
                    "prioritySuggestion": {
                        "type": "STRING",
                        "enum": ["LOW", "MEDIUM", "HIGH"]
                    },
                    "steps": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" }
                    }
                },
                "required": ["motivation", "prioritySuggestion", "steps"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn parse_response(body: &str) -> Result<AiAnalysis, AnalyzerError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|err| AnalyzerError::Parse(err.to_string()))?;

    let text = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.text)
        .ok_or_else(|| AnalyzerError::Parse("response has no text part".to_string()))?;

    serde_json::from_str(&text).map_err(|err| AnalyzerError::Parse(err.to_string()))
}
