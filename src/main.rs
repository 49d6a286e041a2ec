mod auth;
mod chat;
mod dashboard;
mod error;
mod intake;
mod shell;
mod state;
mod store;

use anyhow::Context;
use chat::{ChatRelay, DisabledGenerator, GeminiClient, TextGenerator};
use clap::Parser;
use state::AppState;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Passkey used when none is configured.
const DEFAULT_ADMIN_PASSKEY: &str = "12345678";

#[derive(Parser, Debug)]
#[command(name = "talentscout", about = "Candidate intake and hiring assistant")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Directory holding users.json, candidates.json, login_count.json and resumes/.
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Shared secret that grants admin access at signup.
    #[arg(long, env = "ADMIN_PASSKEY", default_value = DEFAULT_ADMIN_PASSKEY, hide_env_values = true)]
    admin_passkey: String,

    /// Gemini API key. If unset, the chatbot answers every question with an error.
    #[arg(long, env = "GOOGLE_GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
    gemini_model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, env = "GEMINI_BASE_URL", default_value = chat::DEFAULT_BASE_URL)]
    gemini_base_url: String,

    /// Timeout for a single chat request, in seconds
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "120")]
    chat_timeout_secs: u64,

    /// Largest accepted request body (resume uploads), in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "10485760")]
    max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (silently ignored if absent).
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talentscout=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let store = store::Store::open(&args.data_dir)
        .await
        .with_context(|| format!("Cannot create data directory {}", args.data_dir.display()))?;
    tracing::info!("data dir: {}", store.root().display());

    if args.admin_passkey == DEFAULT_ADMIN_PASSKEY {
        tracing::warn!("ADMIN_PASSKEY not set; using the built-in default passkey");
    }

    let generator: Arc<dyn TextGenerator> = match args.gemini_api_key {
        Some(key) if !key.is_empty() => {
            tracing::info!("Chatbot enabled (model: {})", args.gemini_model);
            Arc::new(
                GeminiClient::new(
                    key,
                    args.gemini_model,
                    args.gemini_base_url,
                    Duration::from_secs(args.chat_timeout_secs),
                )
                .context("Cannot build HTTP client")?,
            )
        }
        _ => {
            tracing::warn!("Chatbot disabled (GOOGLE_GEMINI_API_KEY not set)");
            Arc::new(DisabledGenerator)
        }
    };

    let state = AppState {
        store,
        sessions: auth::SessionStore::default(),
        chat: ChatRelay::new(generator),
        admin_passkey: args.admin_passkey,
    };

    // CatchPanicLayer is outermost so it recovers from panics anywhere in the stack.
    let app = shell::app(state, args.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;

    tracing::info!("Listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result { tracing::error!("ctrl-c error: {}", e); }
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
    tracing::info!("Shutting down gracefully");
}
