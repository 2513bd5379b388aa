use clap::Parser;
use sorcerer_gateway::main_helper::build_http_client;
use sorcerer_gateway::{routes, AppState, Args, GatewayConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let _guard = sorcerer_gateway::logging::init_tracing(&args.log_dir);
    sorcerer_gateway::logging::setup_panic_hook();

    let client = match build_http_client() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e.inner);
            std::process::exit(1);
        }
    };

    let config = GatewayConfig::from_env(args.fallback_backends.clone());
    let candidates = config.candidates();
    tracing::info!(
        "Backend candidates: {}",
        candidates
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let state = Arc::new(AppState::new(client, config));
    if state.secondary.is_none() {
        tracing::warn!("GEMINI_API_KEY not set; direct generation tier disabled");
    }

    let app = routes::router(state, args.max_body_size);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Sorcerer gateway listening on {}", addr);
    use futures_util::FutureExt;

    let server_future = async move { axum::serve(listener, app).await };

    match std::panic::AssertUnwindSafe(server_future)
        .catch_unwind()
        .await
    {
        Ok(result) => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        Err(panic_payload) => {
            let message = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                *s
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.as_str()
            } else {
                "Unknown panic"
            };
            tracing::error!(target: "panic", "CRITICAL: Server task panicked: {}", message);
        }
    }
}
