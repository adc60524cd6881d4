//! GeminiImageService - REST client for Gemini image generation.
//!
//! Sends the prompt (and, for edits, the source image as inline data) to
//! `generateContent` and returns the first image part of the answer as an
//! embedded `data:` string.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pixshop_core::config::GenerationSettings;
use pixshop_core::generation::{GenerationConfig, GenerationError, GenerationService};
use pixshop_core::image::{DEFAULT_IMAGE_MIME, ImageFile};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Finish reasons that mean the provider withheld the output.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
];

/// Generation service backed by the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiImageService {
    client: Client,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    base_url: String,
}

impl GeminiImageService {
    /// Creates a new service with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Builds a service from the `[generation]` config table.
    ///
    /// `api_key` is the resolved key (environment first, then config).
    pub fn from_settings(
        settings: &GenerationSettings,
        api_key: Option<String>,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.filter(|key| !key.trim().is_empty()).ok_or_else(|| {
            GenerationError::InvalidRequest(
                "no API key configured (set GEMINI_API_KEY or generation.api_key)".to_string(),
            )
        })?;
        let mut service = Self::new(api_key, settings.model.clone());
        service.temperature = settings.temperature;
        Ok(service)
    }

    /// Overrides the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        source: Option<&ImageFile>,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerateContentRequest, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("prompt is empty".to_string()));
        }

        let mut parts = Vec::new();
        if let Some(file) = source {
            let mime_type = if file.mime_type.is_empty() {
                DEFAULT_IMAGE_MIME.to_string()
            } else {
                file.mime_type.clone()
            };
            parts.push(Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type,
                    data: BASE64_STANDARD.encode(&file.bytes),
                },
            });
        }

        let text = match config.style_hint.as_deref() {
            Some(hint) if !hint.trim().is_empty() => format!("{prompt}\n\n{hint}"),
            _ => prompt.to_string(),
        };
        parts.push(Part::Text { text });

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfigPayload {
                temperature: config.temperature.or(self.temperature),
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        })
    }

    async fn send_request(
        &self,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/{model}:generateContent", self.base_url);
        debug!(%model, "Sending Gemini image request");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| GenerationError::Provider {
                status_code: None,
                message: format!("Gemini API request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|err| GenerationError::Provider {
                status_code: None,
                message: format!("Failed to parse Gemini response: {err}"),
                is_retryable: false,
            })?;

        extract_image_response(parsed)
    }

    async fn run(
        &self,
        source: Option<&ImageFile>,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        let request = self.build_request(source, prompt, config)?;
        let model = config.model.as_deref().unwrap_or(&self.model);
        self.send_request(model, &request).await.map_err(|e| {
            warn!(error = %e, "Gemini image request failed");
            e
        })
    }
}

#[async_trait]
impl GenerationService for GeminiImageService {
    async fn generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        self.run(None, prompt, config).await
    }

    async fn transform(
        &self,
        source: &ImageFile,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, GenerationError> {
        if source.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "source image has no data".to_string(),
            ));
        }
        self.run(Some(source), prompt, config).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfigPayload,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_modalities: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
    block_reason_message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    #[serde(alias = "inline_data")]
    inline_data: Option<InlineDataPayload>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_image_response(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            let reason = match feedback.block_reason_message {
                Some(message) => format!("{reason}: {message}"),
                None => reason,
            };
            return Err(GenerationError::SafetyBlocked { reason });
        }
    }

    let candidates = response.candidates.unwrap_or_default();
    let mut texts = Vec::new();
    let mut finish_reasons = Vec::new();

    for candidate in candidates {
        if let Some(reason) = candidate.finish_reason {
            finish_reasons.push(reason);
        }
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                if !inline.data.is_empty() {
                    let mime_type = if inline.mime_type.is_empty() {
                        DEFAULT_IMAGE_MIME.to_string()
                    } else {
                        inline.mime_type
                    };
                    return Ok(format!("data:{mime_type};base64,{}", inline.data));
                }
            }
            if let Some(text) = part.text {
                texts.push(text);
            }
        }
    }

    if let Some(reason) = finish_reasons
        .iter()
        .find(|reason| BLOCKING_FINISH_REASONS.contains(&reason.as_str()))
    {
        return Err(GenerationError::SafetyBlocked {
            reason: reason.clone(),
        });
    }

    let detail = if texts.is_empty() {
        match finish_reasons.first() {
            Some(reason) => format!("finish reason {reason}"),
            None => "empty response".to_string(),
        }
    } else {
        texts.join(" ")
    };
    Err(GenerationError::NoImage(detail))
}

fn map_http_error(status: StatusCode, body: String) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GenerationError::Provider {
        status_code: Some(status.as_u16()),
        message,
        is_retryable,
    }
}
