//! Router assembly and process startup.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use http::HeaderValue;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::ai::{GeminiProvider, ProviderChatModel};
use crate::adapters::http::{chat_router, ChatAppState};
use crate::application::ChatSessionHandler;
use crate::config::{AppConfig, ValidationError};
use crate::ports::{AIError, ChatModel};

/// Failures that stop the process before or while serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("model client setup failed: {0}")]
    Model(#[from] AIError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the Axum router with all routes.
///
/// An empty origin list allows any origin.
pub fn build_router(
    model: Arc<dyn ChatModel>,
    cors_origins: &[String],
) -> Result<Router, ValidationError> {
    let state = ChatAppState::new(ChatSessionHandler::new(model));
    Ok(chat_router()
        .with_state(state)
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, ValidationError> {
    if origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).map_err(|_| ValidationError::InvalidCorsOrigin(o.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Builds the Gemini-backed chat model from configuration.
pub fn build_model(config: &AppConfig) -> Result<Arc<dyn ChatModel>, ServerError> {
    let provider = GeminiProvider::new(config.ai.gemini_config()?)?;
    let model = ProviderChatModel::new(Arc::new(provider)).with_settings(config.ai.chat_settings());
    Ok(Arc::new(model))
}

/// Binds the listener, then serves until `shutdown` resolves.
///
/// Sessions still open at shutdown are dropped with the runtime.
pub async fn run<F>(config: AppConfig, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;

    let model = build_model(&config)?;
    let router = build_router(model, &config.server.cors_origins_list())?;

    let addr: SocketAddr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        %local_addr,
        model = %config.ai.model,
        "Chat relay listening on /chat/"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Chat relay stopped");
    Ok(())
}
