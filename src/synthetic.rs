//! Last-resort substitutes. Everything here is offline and deterministic
//! given its inputs (time is passed in), and never fails.

use crate::constants::*;
use crate::persona::{AudienceTargeting, LocalPersona, PersonaTraits};
use crate::str_utils::prefix_chars;
use crate::types::{is_truthy, AudienceSuggestions, GeneratedArtifact, NetworkErrorLog};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Percent-encoded seed from the first 64 characters of the prompt.
pub fn placeholder_seed(prompt: &str) -> String {
    let head = prefix_chars(prompt, PLACEHOLDER_SEED_CHARS);
    let head = if head.is_empty() { "avatar" } else { head };
    urlencoding::encode(head).into_owned()
}

fn dicebear_url(encoded_seed: &str) -> String {
    format!("{}?seed={}", DICEBEAR_BOTTTS_URL, encoded_seed)
}

pub fn image_placeholder(prompt: &str, log: &NetworkErrorLog) -> GeneratedArtifact {
    GeneratedArtifact::Placeholder {
        url: dicebear_url(&placeholder_seed(prompt)),
        reason: format!("Backend image service unreachable ({})", log),
    }
}

/// Used when the request could not even be interpreted.
pub fn error_placeholder(message: &str, now: DateTime<Utc>) -> GeneratedArtifact {
    let seed = format!("error-{}", now.timestamp_millis());
    GeneratedArtifact::Placeholder {
        url: dicebear_url(&urlencoding::encode(&seed)),
        reason: format!("Avatar proxy error: {}", message),
    }
}

pub fn unreachable_warning(log: &NetworkErrorLog) -> String {
    format!("Backend API unreachable ({})", log)
}

/// Builds a complete persona record from a creation payload nobody accepted.
pub fn local_persona(payload: &Value, log: &NetworkErrorLog, now: DateTime<Utc>) -> LocalPersona {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    LocalPersona {
        id: now.timestamp_millis(),
        name: text_or(payload, "name", DEFAULT_PERSONA_NAME),
        face_image_url: text_or(payload, "face_image_url", ""),
        persona: PersonaTraits {
            background: text_or(payload, "background_info", ""),
            goals: string_list(payload, "goals"),
            tone: text_or(payload, "tone", DEFAULT_TONE),
        },
        mode: text_or(payload, "mode", DEFAULT_MODE),
        audience_targeting: AudienceTargeting {
            age_range: age_range(payload, "audience_age_range").unwrap_or(DEFAULT_AGE_RANGE),
            gender: text_or(payload, "audience_gender", DEFAULT_GENDER),
            interests: string_list(payload, "audience_interests"),
            region: text_or(payload, "audience_region", DEFAULT_REGION),
        },
        growth_phase_enabled: payload.get("growth_phase_enabled").map(is_truthy).unwrap_or(false),
        growth_intensity: payload
            .get("growth_intensity")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_GROWTH_INTENSITY),
        posting_frequency: payload.get("posting_frequency").filter(|v| is_truthy(v)).cloned(),
        is_active: true,
        created_at: timestamp.clone(),
        updated_at: timestamp,
        local_only: true,
        warning: Some(unreachable_warning(log)),
        followers: None,
        engagement: None,
    }
}

/// Keyword-clustered audience proposal for when no model is available.
pub fn heuristic_suggestions(name: &str, tone: &str, background_info: &str) -> AudienceSuggestions {
    let text = format!("{} {} {}", name, tone, background_info).to_lowercase();

    let interests = INTEREST_CLUSTERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, interests)| *interests)
        .unwrap_or(DEFAULT_INTERESTS);

    AudienceSuggestions {
        goals: SUGGESTED_GOALS.iter().map(|g| g.to_string()).collect(),
        audience_age_range: SUGGESTED_AGE_RANGE,
        audience_gender: DEFAULT_GENDER.to_string(),
        audience_interests: interests.iter().map(|i| i.to_string()).collect(),
        audience_region: DEFAULT_REGION.to_string(),
        fallback: true,
    }
}

fn text_or(payload: &Value, key: &str, default: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(v @ Value::Number(_)) if is_truthy(v) => v.to_string(),
        _ => default.to_string(),
    }
}

fn string_list(payload: &Value, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn age_range(payload: &Value, key: &str) -> Option<[u32; 2]> {
    let items = payload.get(key)?.as_array()?;
    match items.as_slice() {
        [low, high] => Some([low.as_f64()? as u32, high.as_f64()? as u32]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NetworkFailure;
    use chrono::TimeZone;
    use serde_json::json;

    fn log_with_one() -> NetworkErrorLog {
        let mut log = NetworkErrorLog::default();
        log.push(NetworkFailure {
            candidate: "http://127.0.0.1:8000".into(),
            message: "connection refused".to_string(),
        });
        log
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn placeholder_url_encodes_prompt() {
        let artifact = image_placeholder("retro arcade avatar", &log_with_one());
        match artifact {
            GeneratedArtifact::Placeholder { url, reason } => {
                assert_eq!(
                    url,
                    "https://api.dicebear.com/7.x/bottts/svg?seed=retro%20arcade%20avatar"
                );
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn placeholder_seed_is_truncated_to_64_chars() {
        let prompt = "a".repeat(100);
        assert_eq!(placeholder_seed(&prompt), "a".repeat(64));
        assert_eq!(placeholder_seed(""), "avatar");
    }

    #[test]
    fn error_placeholder_uses_timestamp_seed() {
        let artifact = error_placeholder("bad body", fixed_now());
        let GeneratedArtifact::Placeholder { url, reason } = artifact else {
            panic!("expected placeholder");
        };
        assert!(url.ends_with(&format!("seed=error-{}", fixed_now().timestamp_millis())));
        assert_eq!(reason, "Avatar proxy error: bad body");
    }

    #[test]
    fn local_persona_applies_defaults() {
        let persona = local_persona(&json!({}), &log_with_one(), fixed_now());
        assert_eq!(persona.id, fixed_now().timestamp_millis());
        assert_eq!(persona.name, "New Influencer");
        assert_eq!(persona.persona.tone, "casual");
        assert_eq!(persona.mode, "lifestyle");
        assert_eq!(persona.audience_targeting.age_range, [18, 35]);
        assert_eq!(persona.audience_targeting.gender, "all");
        assert_eq!(persona.audience_targeting.region, "North America");
        assert_eq!(persona.growth_intensity, 0.5);
        assert!(!persona.growth_phase_enabled);
        assert!(persona.is_active);
        assert!(persona.local_only);
        assert_eq!(persona.created_at, "2026-03-01T12:00:00.000Z");
        assert_eq!(persona.created_at, persona.updated_at);
        assert!(persona.warning.unwrap().contains("connection refused"));
    }

    #[test]
    fn local_persona_copies_payload() {
        let payload = json!({
            "name": "Ada",
            "tone": "witty",
            "background_info": "coder",
            "goals": ["ship", 3, "teach"],
            "audience_age_range": [21, 40],
            "audience_interests": ["rust"],
            "growth_phase_enabled": 1,
            "growth_intensity": "high",
            "posting_frequency": { "story_interval_hours": 4 }
        });
        let persona = local_persona(&payload, &NetworkErrorLog::default(), fixed_now());
        assert_eq!(persona.name, "Ada");
        assert_eq!(persona.persona.background, "coder");
        assert_eq!(persona.persona.goals, vec!["ship", "teach"]);
        assert_eq!(persona.audience_targeting.age_range, [21, 40]);
        assert!(persona.growth_phase_enabled);
        assert_eq!(persona.growth_intensity, 0.5);
        assert_eq!(persona.posting_frequency, Some(json!({ "story_interval_hours": 4 })));
        assert_eq!(persona.warning.as_deref(), Some("Backend API unreachable (connection failed)"));
    }

    #[test]
    fn suggestions_classify_by_keyword() {
        let s = heuristic_suggestions("Max", "upbeat", "daily fitness routines");
        assert_eq!(s.audience_interests, vec!["fitness", "wellness", "healthy habits"]);
        assert!(s.fallback);
        assert_eq!(s.audience_age_range, [18, 34]);

        let s = heuristic_suggestions("Bo", "calm", "street FOOD tours");
        assert_eq!(s.audience_interests, vec!["food", "recipes", "restaurants"]);

        let s = heuristic_suggestions("Cy", "dry", "knitting");
        assert_eq!(s.audience_interests, vec!["social media", "lifestyle", "creator economy"]);
        assert_eq!(s.goals.len(), 3);
    }

    #[test]
    fn earlier_cluster_wins() {
        let s = heuristic_suggestions("Dee", "chic", "travel and fashion");
        assert_eq!(s.audience_interests, vec!["travel", "adventure", "culture"]);
    }
}
