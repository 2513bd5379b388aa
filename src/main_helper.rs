use crate::constants::*;
use crate::failover::{dispatch, FailoverOutcome};
use crate::gemini::GeminiAdapter;
use crate::resolver::resolve_candidates;
use crate::str_utils::non_empty;
use crate::types::*;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    pub max_body_size: usize,
    /// Backend base URLs tried after BACKEND_URL, in order. Repeatable.
    #[arg(long = "fallback-backend", default_values_t = DEFAULT_FALLBACK_BACKENDS.iter().map(|s| s.to_string()).collect::<Vec<_>>())]
    pub fallback_backends: Vec<String>,
    #[arg(long, default_value = "logs")]
    pub log_dir: String,
}

/// Everything the orchestration layer needs to know about its surroundings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub backend_url: Option<String>,
    pub fallback_backends: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub gemini_image_model: String,
    pub gemini_text_model: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            fallback_backends: crate::resolver::default_fallbacks(),
            gemini_api_key: None,
            gemini_api_base: GEMINI_API_BASE.to_string(),
            gemini_image_model: DEFAULT_GEMINI_IMAGE_MODEL.to_string(),
            gemini_text_model: DEFAULT_GEMINI_TEXT_MODEL.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Reads `BACKEND_URL`, `GEMINI_API_KEY`, `GEMINI_API_BASE`,
    /// `GEMINI_IMAGE_MODEL` and `GEMINI_TEXT_MODEL`. Blank values count as unset.
    pub fn from_env(fallback_backends: Vec<String>) -> Self {
        let var = |name: &str| non_empty(std::env::var(name).ok().as_deref());
        let defaults = Self::default();
        Self {
            backend_url: var("BACKEND_URL"),
            fallback_backends,
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_api_base: var("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            gemini_image_model: var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.gemini_image_model),
            gemini_text_model: var("GEMINI_TEXT_MODEL").unwrap_or(defaults.gemini_text_model),
        }
    }

    pub fn candidates(&self) -> Vec<CandidateAddress> {
        resolve_candidates(self.backend_url.as_deref(), &self.fallback_backends)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub config: Arc<GatewayConfig>,
    pub secondary: Option<GeminiAdapter>,
}

impl AppState {
    pub fn new(client: reqwest::Client, config: GatewayConfig) -> Self {
        let secondary = GeminiAdapter::from_config(client.clone(), &config);
        Self {
            client,
            config: Arc::new(config),
            secondary,
        }
    }

    /// Resolves candidates fresh and walks them for one logical request.
    pub async fn dispatch(&self, request: &ForwardedRequest) -> FailoverOutcome {
        let candidates = self.config.candidates();
        dispatch(&self.client, &candidates, request).await
    }
}

pub fn build_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(std::time::Duration::from_secs(60)))
        .build()?;
    Ok(client)
}
