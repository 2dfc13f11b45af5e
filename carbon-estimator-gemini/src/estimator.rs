use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use carbon_core::{AnswerMap, EmissionResult, EstimationError, Estimator};
use serde::Serialize;
use tracing::{debug, warn};

use crate::prompt::build_prompt;
use crate::response::{candidate_text, parse_emission_json};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Upstream error bodies are cut to this many characters before they are
/// surfaced to the user.
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    temperature: f32,
}

/// Calls `POST {endpoint}/v1beta/models/{model}:generateContent` with the
/// answers rendered as a prompt.
///
/// The HTTP client carries the configured timeout, so a hung upstream is
/// reported as [`EstimationError::Timeout`] even outside the wizard
/// runtime.
pub struct GeminiEstimator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl GeminiEstimator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EstimationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EstimationError::Configuration(format!("http client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn map_send_error(
        &self,
        err: reqwest::Error,
    ) -> EstimationError {
        if err.is_timeout() {
            EstimationError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            EstimationError::Transport(err.without_url().to_string())
        }
    }
}

impl fmt::Debug for GeminiEstimator {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("GeminiEstimator")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn request_body(prompt: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: [RequestContent {
            role: "user",
            parts: [RequestPart { text: prompt }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            temperature: 0.2,
        },
    }
}

fn truncate(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[async_trait]
impl Estimator for GeminiEstimator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn compute(
        &self,
        answers: &AnswerMap,
    ) -> Result<EmissionResult, EstimationError> {
        let prompt = build_prompt(answers);
        debug!(model = %self.model, answers = answers.len(), "requesting gemini estimate");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(&prompt))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            warn!(%status, "gemini rejected estimate request");
            return Err(EstimationError::Upstream(format!(
                "{status}: {}",
                truncate(&body)
            )));
        }

        let text = candidate_text(&body)?;
        parse_emission_json(&text)
    }
}
