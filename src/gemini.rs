use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credential::Validity;

macro_rules! debug_println {
    ($($arg:tt)*) => {
        if std::env::var("REPROMPT_DEBUG").is_ok() {
            eprintln!($($arg)*);
        }
    };
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Error message cap so an HTML error page doesn't flood the error view.
const MAX_ERROR_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited, slow down and retry")]
    RateLimited,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("model returned no text")]
    Empty,
}

pub struct GeminiClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(model: String) -> Self {
        Self::with_config(DEFAULT_BASE_URL.to_string(), model)
    }

    pub fn with_config(base_url: String, model: String) -> Self {
        GeminiClient {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Sends an image plus the fixed analysis instructions, returning the
    /// model's raw text response.
    pub async fn generate_from_image(
        &self,
        image_base64: &str,
        mime_type: &str,
        instructions: &str,
        key: &str,
    ) -> Result<String, GeminiError> {
        let parts = vec![
            RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: image_base64.to_string(),
                },
            },
            RequestPart::Text {
                text: instructions.to_string(),
            },
        ];
        self.generate(parts, true, key).await
    }

    /// Sends a text-only prompt (modify and translate operations).
    pub async fn generate_from_text(&self, prompt: &str, key: &str) -> Result<String, GeminiError> {
        let parts = vec![RequestPart::Text {
            text: prompt.to_string(),
        }];
        self.generate(parts, true, key).await
    }

    /// Minimal no-op request to check whether a candidate key is usable.
    /// Never fails: every error collapses to `Invalid`.
    pub async fn probe(&self, key: &str) -> Validity {
        let parts = vec![RequestPart::Text {
            text: "test".to_string(),
        }];
        match self.generate(parts, false, key).await {
            Ok(_) => Validity::Valid,
            Err(err) => {
                debug_println!("[Gemini] probe failed: {}", err);
                Validity::Invalid
            }
        }
    }

    async fn generate(
        &self,
        parts: Vec<RequestPart>,
        json_output: bool,
        key: &str,
    ) -> Result<String, GeminiError> {
        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: json_output.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug_println!("[Gemini] POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = truncate(&response.text().await.unwrap_or_default());
            debug_println!("[Gemini] error {}: {}", status, message);
            return Err(match status.as_u16() {
                401 | 403 => GeminiError::Auth(message),
                429 => GeminiError::RateLimited,
                s => GeminiError::Api { status: s, message },
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_text(parsed).ok_or(GeminiError::Empty)
    }
}

/// Concatenates the text parts of the first candidate, if any.
fn extract_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn truncate(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.len() <= MAX_ERROR_LEN {
        trimmed.to_string()
    } else {
        let mut end = MAX_ERROR_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

// Request/Response wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}
