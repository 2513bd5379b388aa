use crate::constants::*;
use serde::{Deserialize, Serialize};

/// Persona record as the backend stores it. Missing fields decode to the
/// same defaults the local builder uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocalPersona {
    pub id: i64,
    pub name: String,
    pub face_image_url: String,
    pub persona: PersonaTraits,
    pub mode: String,
    pub audience_targeting: AudienceTargeting,
    pub growth_phase_enabled: bool,
    pub growth_intensity: f64,
    pub posting_frequency: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub local_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement: Option<String>,
}

impl Default for LocalPersona {
    fn default() -> Self {
        Self {
            id: 0,
            name: DEFAULT_PERSONA_NAME.to_string(),
            face_image_url: String::new(),
            persona: PersonaTraits::default(),
            mode: DEFAULT_MODE.to_string(),
            audience_targeting: AudienceTargeting::default(),
            growth_phase_enabled: false,
            growth_intensity: DEFAULT_GROWTH_INTENSITY,
            posting_frequency: None,
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
            local_only: false,
            warning: None,
            followers: None,
            engagement: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonaTraits {
    pub background: String,
    pub goals: Vec<String>,
    pub tone: String,
}

impl Default for PersonaTraits {
    fn default() -> Self {
        Self {
            background: String::new(),
            goals: Vec::new(),
            tone: DEFAULT_TONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudienceTargeting {
    pub age_range: [u32; 2],
    pub gender: String,
    pub interests: Vec<String>,
    pub region: String,
}

impl Default for AudienceTargeting {
    fn default() -> Self {
        Self {
            age_range: DEFAULT_AGE_RANGE,
            gender: DEFAULT_GENDER.to_string(),
            interests: Vec::new(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}
