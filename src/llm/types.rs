use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image: SourceImage,
    pub prompt: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(#[allow(dead_code)] Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

impl GenerateContentResponse {
    /// First inline image part of the first candidate, if any.
    pub fn first_inline_image(&self) -> Option<&InlineData> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        parts.iter().find_map(|part| match part {
            Part::InlineData { inline_data }
                if inline_data.mime_type.is_empty()
                    || inline_data.mime_type.starts_with("image/") =>
            {
                Some(inline_data)
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_parts_and_picks_the_first_image() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            {"text": "Here is your portrait."},
                            {"inlineData": {"mimeType": "image/png", "data": "Zmlyc3Q="}},
                            {"inlineData": {"mimeType": "image/png", "data": "c2Vjb25k"}}
                        ]
                    },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"totalTokenCount": 1290}
            }"#,
        )
        .unwrap();
        let image = response.first_inline_image().unwrap();
        assert_eq!(image.data, "Zmlyc3Q=");
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn images_outside_the_first_candidate_are_ignored() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [
                {"content": {"parts": [{"text": "I can't do that."}]}},
                {"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "eA=="}}]}}
            ]}"#,
        )
        .unwrap();
        assert!(response.first_inline_image().is_none());
    }

    #[test]
    fn non_image_inline_data_is_skipped() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "audio/wav", "data": "eA=="}},
                {"inlineData": {"mimeType": "image/jpeg", "data": "eQ=="}}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_inline_image().unwrap().data, "eQ==");
    }

    #[test]
    fn empty_or_blocked_responses_have_no_image() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(response.candidates.is_empty());
        assert!(response.first_inline_image().is_none());
    }
}
