use once_cell::sync::Lazy;
use regex::Regex;

const GENERIC_FAILURE_MESSAGE: &str = "Studio error. Please try again.";

static QUOTA_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"quota|limit|resource_exhausted|too many requests|\b429\b")
        .expect("valid quota marker regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudioError {
    #[error("Unknown value '{value}' for {field}")]
    UnknownEnumerationValue { field: &'static str, value: String },

    #[error("The studio failed to deliver a portrait")]
    NoImagePayload,

    #[error("Image service quota exceeded")]
    QuotaExceeded,

    #[error("Image service error: {0}")]
    ServiceError(String),

    #[error("Invalid source image: {0}")]
    InvalidSourceImage(String),
}

impl StudioError {
    pub fn unknown(field: &'static str, value: impl Into<String>) -> Self {
        StudioError::UnknownEnumerationValue {
            field,
            value: value.into(),
        }
    }

    /// Text shown to the person operating the studio.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::UnknownEnumerationValue { field, value } => {
                format!("Saved settings contain an unsupported {field}: '{value}'.")
            }
            StudioError::NoImagePayload => {
                "The studio failed to deliver a portrait. Please try again.".to_string()
            }
            StudioError::QuotaExceeded => {
                "The studio is at capacity right now. Please try again later.".to_string()
            }
            StudioError::ServiceError(message) => {
                if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message.clone()
                }
            }
            StudioError::InvalidSourceImage(reason) => {
                format!("That file can't be used as a source photo: {reason}.")
            }
        }
    }
}

/// Failure reported by an [`ImageService`](crate::llm::ImageService) before any
/// response body could be interpreted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ServiceFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

// Keyword match on the error text. Status codes only help when the adapter saw one,
// so the text is always inspected.
pub fn classify_service_failure(failure: &ServiceFailure) -> StudioError {
    let lowered = failure.message.to_lowercase();
    if failure.status == Some(429) || QUOTA_MARKER_RE.is_match(&lowered) {
        return StudioError::QuotaExceeded;
    }
    StudioError::ServiceError(failure.message.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_markers_are_classified_as_quota_exceeded() {
        for message in [
            "Gemini request failed with status 429 Too Many Requests: Resource has been exhausted (e.g. check quota).",
            "RESOURCE_EXHAUSTED",
            "Rate limit reached for requests",
        ] {
            let failure = ServiceFailure::new(message);
            assert_eq!(classify_service_failure(&failure), StudioError::QuotaExceeded);
        }
    }

    #[test]
    fn status_429_without_marker_text_is_quota() {
        let failure = ServiceFailure::with_status(429, "slow down");
        assert_eq!(classify_service_failure(&failure), StudioError::QuotaExceeded);
    }

    #[test]
    fn other_failures_keep_their_message() {
        let failure =
            ServiceFailure::with_status(500, "Gemini request failed: backend unavailable");
        assert_eq!(
            classify_service_failure(&failure),
            StudioError::ServiceError("Gemini request failed: backend unavailable".to_string())
        );
    }

    #[test]
    fn empty_service_message_uses_generic_fallback() {
        let error = StudioError::ServiceError("  ".to_string());
        assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn quota_message_asks_to_retry_later() {
        assert!(StudioError::QuotaExceeded
            .user_message()
            .contains("try again later"));
    }
}
