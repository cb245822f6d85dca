use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::llm::types::{GenerateContentResponse, GenerationRequest, Part};
use crate::llm::ImageService;
use crate::studio::error::ServiceFailure;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const ERROR_BODY_LOG_LIMIT: usize = 2000;

/// Target for the DEBUG payload and response summaries.
pub const GEMINI_LOG_TARGET: &str = "llm.gemini";

#[derive(Debug, Clone)]
pub struct GeminiImageClient {
    api_key: String,
    base_url: Url,
    model: String,
    timeout: Duration,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let mut summarized_contents = Vec::new();
        for content in contents {
            let role = content
                .get("role")
                .and_then(|value| value.as_str())
                .unwrap_or("user");
            let parts = content
                .get("parts")
                .and_then(|value| value.as_array())
                .map(|parts| summarize_gemini_parts(parts))
                .unwrap_or_default();
            summarized_contents.push(json!({ "role": role, "parts": parts }));
        }
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GenerateContentResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;

    for candidate in &response.candidates {
        let Some(content) = &candidate.content else {
            continue;
        };
        for part in &content.parts {
            match part {
                Part::Text { text } => {
                    text_parts += 1;
                    if text_preview.is_none() && !text.trim().is_empty() {
                        text_preview = Some(truncate_for_log(text, 200));
                    }
                }
                Part::InlineData { inline_data } => {
                    if inline_data.mime_type.starts_with("image/") {
                        image_parts += 1;
                    }
                }
                Part::Other(_) => {}
            }
        }
    }

    json!({
        "candidates": response.candidates.len(),
        "textParts": text_parts,
        "imageParts": image_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), ERROR_BODY_LOG_LIMIT));
    }

    (None, truncate_for_log(trimmed, ERROR_BODY_LOG_LIMIT))
}

pub fn build_image_payload(request: &GenerationRequest) -> Value {
    let encoded = general_purpose::STANDARD.encode(&request.image.bytes);
    let mut generation_config = json!({
        "responseModalities": ["TEXT", "IMAGE"]
    });
    let aspect_ratio = request.aspect_ratio.trim();
    if !aspect_ratio.is_empty() {
        if let Some(config_object) = generation_config.as_object_mut() {
            config_object.insert(
                "imageConfig".to_string(),
                json!({ "aspectRatio": aspect_ratio }),
            );
        }
    }

    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": request.image.mime_type,
                        "data": encoded
                    }
                },
                { "text": request.prompt }
            ]
        }],
        "generationConfig": generation_config,
    })
}

impl GeminiImageClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Url,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url,
            model: model.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.gemini_api_key.clone(),
            config.gemini_base_url.clone(),
            config.gemini_image_model.clone(),
            config.gemini_request_timeout(),
        )
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        )
    }

    fn redact(&self, text: &str) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return text.to_string();
        }
        text.replace(key, "[redacted]")
    }

    async fn call_gemini_api(
        &self,
        payload: Value,
    ) -> Result<GenerateContentResponse, ServiceFailure> {
        let client = get_http_client();
        let url = self.endpoint();

        if tracing::enabled!(target: GEMINI_LOG_TARGET, tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(&payload);
            debug!(target: GEMINI_LOG_TARGET, model = %self.model, payload = %payload_summary);
        }

        let response = match client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err_text = self.redact(&err.to_string());
                warn!(
                    "Gemini request failed to send: {} (timeout={}, connect={}, status={:?})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect(),
                    err.status()
                );
                return Err(ServiceFailure::new(format!(
                    "Gemini request failed: {}",
                    err_text
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Gemini API error: status={}, body={}", status, body_summary);
            let detail = self.redact(&message.unwrap_or(body_summary));
            return Err(ServiceFailure::with_status(
                status.as_u16(),
                format!("Gemini request failed with status {}: {}", status, detail),
            ));
        }

        let value = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| {
                ServiceFailure::with_status(
                    status.as_u16(),
                    format!(
                        "Gemini returned an unreadable response: {}",
                        self.redact(&err.to_string())
                    ),
                )
            })?;
        if tracing::enabled!(target: GEMINI_LOG_TARGET, tracing::Level::DEBUG) {
            let response_summary = summarize_gemini_response(&value);
            debug!(target: GEMINI_LOG_TARGET, model = %self.model, response = %response_summary);
        }
        Ok(value)
    }
}

#[async_trait]
impl ImageService for GeminiImageClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_content(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerateContentResponse, ServiceFailure> {
        let payload = build_image_payload(&request);
        let metadata = json!({
            "aspect_ratio": request.aspect_ratio,
            "prompt_chars": request.prompt.chars().count(),
            "source_bytes": request.image.bytes.len(),
        });
        log_llm_timing(
            "gemini",
            &self.model,
            "generate_headshot",
            Some(metadata),
            || self.call_gemini_api(payload),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::SourceImage;

    fn request() -> GenerationRequest {
        GenerationRequest {
            image: SourceImage {
                bytes: b"photo".to_vec(),
                mime_type: "image/jpeg".to_string(),
            },
            prompt: "TASK: portrait".to_string(),
            aspect_ratio: "1:1".to_string(),
        }
    }

    #[test]
    fn payload_carries_image_then_prompt_and_aspect_ratio() {
        let payload = build_image_payload(&request());
        let parts = payload.pointer("/contents/0/parts").unwrap().as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "cGhvdG8=");
        assert_eq!(parts[1]["text"], "TASK: portrait");
        assert_eq!(
            payload.pointer("/generationConfig/imageConfig/aspectRatio"),
            Some(&json!("1:1"))
        );
        assert_eq!(
            payload.pointer("/generationConfig/responseModalities"),
            Some(&json!(["TEXT", "IMAGE"]))
        );
    }

    #[test]
    fn payload_summary_hides_image_data() {
        let summary = summarize_gemini_payload(&build_image_payload(&request()));
        let text = summary.to_string();
        assert!(!text.contains("cGhvdG8="));
        assert!(text.contains("\"dataLen\":8"));
    }

    #[test]
    fn endpoint_joins_base_url_and_model() {
        let client = GeminiImageClient::new(
            "secret-key",
            Url::parse("https://generativelanguage.googleapis.com").unwrap(),
            "gemini-2.5-flash-image",
            Duration::from_secs(5),
        );
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            client.redact("bad key secret-key in url"),
            "bad key [redacted] in url"
        );
    }

    #[test]
    fn error_body_prefers_the_api_message() {
        let (message, summary) = summarize_error_body(
            r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#,
        );
        assert_eq!(
            message.as_deref(),
            Some("Resource has been exhausted (e.g. check quota).")
        );
        assert!(summary.contains("RESOURCE_EXHAUSTED"));

        let (message, summary) = summarize_error_body("  ");
        assert!(message.is_none());
        assert_eq!(summary, "empty response body");
    }
}
