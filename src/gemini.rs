//! Direct calls to the Gemini `generateContent` REST API, used only after
//! every backend candidate was unreachable.

use crate::constants::*;
use crate::main_helper::GatewayConfig;
use crate::str_utils::error_chain;
use crate::types::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

lazy_static! {
    static ref LEADING_FENCE: Regex = Regex::new(r"^```(?:json)?\s*").expect("Invalid fence regex");
    static ref TRAILING_FENCE: Regex = Regex::new(r"\s*```$").expect("Invalid fence regex");
}

#[derive(Debug, Deserialize, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ResponseCandidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize, Default)]
pub struct InlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        let Some(first) = self.candidates.first() else {
            return &[];
        };
        match &first.content {
            Some(content) if !content.parts.is_empty() => &content.parts,
            _ => &first.parts,
        }
    }

    /// `data:` URL built from the first part carrying inline image bytes.
    pub fn first_inline_image(&self) -> Option<String> {
        self.first_parts().iter().find_map(|part| {
            let inline = part.inline_data.as_ref()?;
            let data = inline.data.as_deref().filter(|d| !d.is_empty())?;
            let mime = inline
                .mime_type
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_IMAGE_MIME);
            Some(format!("data:{};base64,{}", mime, data))
        })
    }

    /// Concatenated text of the first candidate.
    pub fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Removes a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> String {
    let text = text.trim();
    let text = LEADING_FENCE.replace(text, "");
    TRAILING_FENCE.replace(&text, "").into_owned()
}

/// Parses model output into the fixed suggestion shape.
pub fn parse_suggestions(text: &str) -> Result<AudienceSuggestions> {
    let cleaned = strip_code_fence(text);
    let mut suggestions: AudienceSuggestions = serde_json::from_str(&cleaned)?;
    if suggestions.goals.is_empty() || suggestions.audience_interests.is_empty() {
        return Err(GatewayError::Secondary("suggestions missing goals or interests".to_string()).into());
    }
    suggestions.fallback = false;
    Ok(suggestions)
}

pub fn suggestion_prompt(name: &str, tone: &str, background_info: &str) -> String {
    format!(
        r#"Given the following AI influencer profile:
- Name: {name}
- Tone: {tone}
- Background/Mission: {background_info}

Generate a detailed target audience and a set of primary goals for this influencer.
Return ONLY a valid JSON object with the following structure. Do not include markdown formatting or extra text.
{{
  "goals": ["string", "string", "string"],
  "audience_age_range": [number, number],
  "audience_gender": "all" | "male" | "female" | "other",
  "audience_interests": ["string", "string", "string"],
  "audience_region": "North America" | "Europe" | "Asia" | "South America" | "Africa" | "Australia" | "Other"
}}"#
    )
}

#[derive(Clone)]
pub struct GeminiAdapter {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    image_model: String,
    text_model: String,
}

impl GeminiAdapter {
    /// `None` when no credential is configured; the tier is then skipped.
    pub fn from_config(client: reqwest::Client, config: &GatewayConfig) -> Option<Self> {
        let api_key = config.gemini_api_key.clone()?;
        Some(Self {
            client,
            api_key,
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            image_model: config.gemini_image_model.clone(),
            text_model: config.gemini_text_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    async fn generate_content(&self, model: &str, payload: &serde_json::Value) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Secondary(error_chain(&e)))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| GatewayError::Secondary(error_chain(&e)))?;

        if !status.is_success() {
            return Err(GatewayError::Upstream(status, raw).into());
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw)?;
        Ok(parsed)
    }

    /// Portrait generation; yields a `data:` URL.
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        });
        let response = self.generate_content(&self.image_model, &payload).await?;
        response
            .first_inline_image()
            .ok_or_else(|| GatewayError::Secondary("no inline image in response".to_string()).into())
    }

    pub async fn suggest_audience(
        &self,
        name: &str,
        tone: &str,
        background_info: &str,
    ) -> Result<AudienceSuggestions> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": suggestion_prompt(name, tone, background_info) }] }],
        });
        let response = self.generate_content(&self.text_model, &payload).await?;
        parse_suggestions(&response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
    }

    #[test]
    fn picks_first_inline_part() {
        let raw = r#"{"candidates":[{"content":{"parts":[
            {"text":"here you go"},
            {"inline_data":{"mime_type":"image/jpeg","data":"QUJD"}},
            {"inlineData":{"data":"REVG"}}
        ]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.first_inline_image().as_deref(), Some("data:image/jpeg;base64,QUJD"));
    }

    #[test]
    fn inline_part_defaults_to_png() {
        let raw = r#"{"candidates":[{"parts":[{"inlineData":{"data":"REVG"}}]}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.first_inline_image().as_deref(), Some("data:image/png;base64,REVG"));
    }

    #[test]
    fn no_inline_part_yields_none() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"sorry"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.first_inline_image().is_none());
        assert_eq!(parsed.text(), "sorry");
    }

    #[test]
    fn parses_fenced_suggestions() {
        let text = "```json\n{\"goals\":[\"a\",\"b\",\"c\"],\"audience_age_range\":[20,30],\"audience_gender\":\"all\",\"audience_interests\":[\"x\",\"y\",\"z\"],\"audience_region\":\"Europe\"}\n```";
        let s = parse_suggestions(text).unwrap();
        assert_eq!(s.audience_age_range, [20, 30]);
        assert_eq!(s.audience_region, "Europe");
        assert!(!s.fallback);
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(parse_suggestions("{\"goals\":\"grow\"}").is_err());
        assert!(parse_suggestions("not json").is_err());
    }
}
