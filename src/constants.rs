/// Well-known backend addresses tried after the configured `BACKEND_URL`.
/// Covers host networking, docker desktop and compose service names.
pub const DEFAULT_FALLBACK_BACKENDS: &[&str] = &[
    "http://127.0.0.1:8000",
    "http://localhost:8000",
    "http://host.docker.internal:8000",
    "http://backend:8000",
];

/// Backend routes behind the generation-specific endpoints
pub const BACKEND_GENERATE_IMAGE_PATH: &str = "/generate-image";
pub const BACKEND_AUDIENCE_SUGGESTIONS_PATH: &str = "/generate-audience-suggestions";
pub const BACKEND_INIT_PATH: &str = "/sorcerer/init";

/// Gemini REST defaults
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_TEXT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Placeholder avatars
pub const DICEBEAR_BOTTTS_URL: &str = "https://api.dicebear.com/7.x/bottts/svg";
pub const PLACEHOLDER_SEED_CHARS: usize = 64;

pub const DEFAULT_JSON_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Local persona defaults
pub const DEFAULT_PERSONA_NAME: &str = "New Influencer";
pub const DEFAULT_TONE: &str = "casual";
pub const DEFAULT_MODE: &str = "lifestyle";
pub const DEFAULT_AGE_RANGE: [u32; 2] = [18, 35];
pub const DEFAULT_GENDER: &str = "all";
pub const DEFAULT_REGION: &str = "North America";
pub const DEFAULT_GROWTH_INTENSITY: f64 = 0.5;

/// Heuristic audience suggestions
pub const SUGGESTED_AGE_RANGE: [u32; 2] = [18, 34];
pub const SUGGESTED_GOALS: &[&str] = &[
    "grow a loyal audience",
    "publish consistent high-quality content",
    "build brand partnerships",
];

/// Interest clusters, first keyword hit wins. Order matters.
pub const INTEREST_CLUSTERS: &[(&[&str], [&str; 3])] = &[
    (&["fitness", "health"], ["fitness", "wellness", "healthy habits"]),
    (&["tech", "ai"], ["technology", "innovation", "digital trends"]),
    (&["travel"], ["travel", "adventure", "culture"]),
    (&["food"], ["food", "recipes", "restaurants"]),
    (&["fashion", "beauty"], ["fashion", "style", "beauty"]),
];
pub const DEFAULT_INTERESTS: [&str; 3] = ["social media", "lifestyle", "creator economy"];

/// Client-side degraded-mode store
pub const LOCAL_ENTITIES_KEY: &str = "localInfluencers";
pub const LOCAL_ENTITIES_CAP: usize = 100;
pub const LOCAL_PLACEHOLDER_FACE: &str = "https://api.dicebear.com/7.x/bottts/svg?seed=local-profile";
