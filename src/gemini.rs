//! Client for the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::artifact::GeneratedArtifact;
use crate::config::GeminiConfig;
use crate::error::RosterError;
use crate::models::InlineImage;

/// One part of a multimodal request.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Part {
    /// Plain text
    Text {
        /// the text
        text: String,
    },
    /// Base64 image bytes
    InlineData {
        /// the image
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl From<&InlineImage> for Part {
    fn from(image: &InlineImage) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        }
    }
}

/// Base64 payload with its MIME type.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// eg `image/png`
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    /// base64 bytes
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: &'a [Part],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
}

/// `generateContent` response envelope. Every level may be missing, eg when
/// safety filtering drops the candidates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Completions, usually one.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Block reasons and safety ratings for the prompt.
    #[serde(default)]
    pub prompt_feedback: Option<Value>,
}

/// A completion returned by the model.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Content, absent when the candidate was filtered.
    #[serde(default)]
    pub content: Option<CandidateContent>,
    /// eg `STOP`, `SAFETY`, `IMAGE_SAFETY`
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Parts of a candidate.
#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    /// Mixed text and image parts.
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A response part. Text and inline data are both optional so unknown part
/// kinds still decode.
#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    /// Text, if any
    #[serde(default)]
    pub text: Option<String>,
    /// Image, if any
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

impl GenerateContentResponse {
    /// The first part of the first candidate that carries image data.
    pub fn first_inline_image(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|inline| !inline.data.is_empty())
    }

    fn part_kinds(&self) -> Vec<Vec<&'static str>> {
        self.candidates
            .iter()
            .map(|candidate| {
                candidate
                    .content
                    .iter()
                    .flat_map(|content| content.parts.iter())
                    .map(|part| match (&part.inline_data, &part.text) {
                        (Some(_), _) => "inlineData",
                        (None, Some(_)) => "text",
                        (None, None) => "other",
                    })
                    .collect()
            })
            .collect()
    }
}

/// Orders the request parts: prompt text, then the fan photo, then the roster.
pub fn build_parts(
    prompt: &str,
    fan_photo: Option<&InlineImage>,
    roster: &[InlineImage],
) -> Vec<Part> {
    let mut parts = Vec::with_capacity(roster.len() + 2);
    parts.push(Part::Text {
        text: prompt.to_string(),
    });
    if let Some(photo) = fan_photo {
        parts.push(Part::from(photo));
    }
    parts.extend(roster.iter().map(Part::from));
    parts
}

/// Talks to the image model.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// New client sharing `http`'s connection pool.
    pub fn new(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    /// Sends one generation request and pulls the poster out of the answer.
    ///
    /// No retries. A response without image data is [`RosterError::NoImageProduced`].
    pub async fn generate(
        &self,
        prompt: &str,
        fan_photo: Option<&InlineImage>,
        roster: &[InlineImage],
    ) -> Result<GeneratedArtifact, RosterError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| RosterError::Configuration("GOOGLE_API_KEY is not set".to_string()))?;

        let parts = build_parts(prompt, fan_photo, roster);
        info!(
            "Sending request to {} with {} image(s)",
            self.config.model,
            parts.len() - 1
        );
        let body = GenerateContentRequest {
            contents: [RequestContent {
                role: "user",
                parts: &parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: ["IMAGE", "TEXT"],
            },
        };

        let url = self.config.api_url.join(&format!(
            "v1beta/models/{}:generateContent",
            self.config.model
        ))?;
        let resp = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(RosterError::Upstream(format!(
                "Gemini API error {status}: {}",
                text.chars().take(500).collect::<String>()
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        debug!("Candidates structure: {:?}", parsed.part_kinds());
        if let Some(feedback) = &parsed.prompt_feedback {
            warn!("Prompt feedback from model: {feedback}");
        }

        let Some(inline) = parsed.first_inline_image() else {
            if let Some(reason) = parsed
                .candidates
                .first()
                .and_then(|candidate| candidate.finish_reason.as_deref())
            {
                warn!("Model finished without an image, reason {reason}");
            }
            return Err(RosterError::NoImageProduced);
        };
        info!(
            "Image received: {} ({} base64 bytes)",
            inline.mime_type,
            inline.data.len()
        );
        Ok(GeneratedArtifact::new(&inline.mime_type, inline.data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("parse response")
    }

    #[test]
    fn parts_are_text_then_fan_then_roster() {
        let fan = InlineImage::from_bytes("image/jpeg", b"fan");
        let roster = vec![
            InlineImage::from_bytes("image/png", b"p1"),
            InlineImage::from_bytes("image/webp", b"p2"),
        ];
        let parts = build_parts("prompt", Some(&fan), &roster);
        assert_eq!(parts.len(), 4);
        assert_eq!(
            parts[0],
            Part::Text {
                text: "prompt".to_string()
            }
        );
        assert_eq!(parts[1], Part::from(&fan));
        assert_eq!(parts[3], Part::from(&roster[1]));

        let encoded = serde_json::to_value(&parts).expect("serialize");
        assert_eq!(encoded[1]["inlineData"]["mimeType"], json!("image/jpeg"));
        assert_eq!(encoded[2]["inlineData"]["mimeType"], json!("image/png"));

        let without_fan = build_parts("prompt", None, &roster);
        assert_eq!(without_fan.len(), 3);
        assert_eq!(without_fan[1], Part::from(&roster[0]));
    }

    #[test]
    fn finds_first_image_after_text() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                    {"inlineData": {"mimeType": "image/jpeg", "data": "BBBB"}}
                ]}
            }]
        }));
        let inline = response.first_inline_image().expect("image");
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(inline.data, "AAAA");
    }

    #[test]
    fn snake_case_inline_data_is_accepted() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [
                    {"inline_data": {"mime_type": "image/webp", "data": "CCCC"}}
                ]}
            }]
        }));
        assert_eq!(
            response.first_inline_image().map(|inline| inline.mime_type.as_str()),
            Some("image/webp")
        );
    }

    #[test]
    fn only_the_first_candidate_counts() {
        let response = parse(json!({
            "candidates": [
                {"content": {"parts": [{"text": "sorry"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "AAAA"}}]}}
            ]
        }));
        assert!(response.first_inline_image().is_none());
    }

    #[test]
    fn filtered_responses_have_no_image() {
        for value in [
            json!({}),
            json!({"candidates": []}),
            json!({"candidates": [{"finishReason": "IMAGE_SAFETY"}]}),
            json!({"candidates": [{"content": {}}]}),
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        ] {
            assert!(parse(value).first_inline_image().is_none());
        }
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GeminiClient::new(
            reqwest::Client::new(),
            GeminiConfig {
                api_key: None,
                model: "test-model".to_string(),
                // nothing listens here
                api_url: url::Url::parse("http://127.0.0.1:9").expect("url"),
            },
        );
        let result = client.generate("prompt", None, &[]).await;
        assert!(matches!(result, Err(RosterError::Configuration(_))));
    }
}
