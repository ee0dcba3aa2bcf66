//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the dispatch engine in an axum fallback service
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer request bodies and run dispatch on the blocking pool
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ListenerConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::routing::Router;

/// Largest request body buffered for handlers.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Error type for the server loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
}

/// HTTP server in front of a [`Router`].
pub struct HttpServer {
    app: axum::Router,
    config: ListenerConfig,
}

impl HttpServer {
    /// Create a new HTTP server dispatching to `router`.
    pub fn new(router: Arc<Router>, config: ListenerConfig) -> Self {
        let app = Self::build_app(&config, AppState { router });
        Self { app, config }
    }

    /// Build the axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &ListenerConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
            )
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|source| ServerError::Bind {
                address: self.config.bind_address.clone(),
                source,
            })
    }

    /// The axum app, for driving the server without a socket.
    pub fn into_app(self) -> axum::Router {
        self.app
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the request and hand it to the router.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable request body");
            return (StatusCode::BAD_REQUEST, "400 bad request").into_response();
        }
    };
    let request = Request::from_parts(parts, bytes);

    tracing::debug!(
        request_id = request_id(&request).unwrap_or("unknown"),
        method = %request.method(),
        path = %request.uri().path(),
        "Dispatching request"
    );

    // handlers and file reads are synchronous
    let router = state.router.clone();
    match tokio::task::spawn_blocking(move || router.serve(request)).await {
        Ok(writer) => writer.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error").into_response()
        }
    }
}
