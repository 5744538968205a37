//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that hands every request to the engine
//! - Wire up middleware (tracing, timeout, request ID)
//! - Buffer request bodies up to the configured limit
//! - Bind server to listener and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, FromRequest, State},
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::ServerError;
use crate::http::request::RequestIdGenerator;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub max_body_size: usize,
}

/// HTTP host for an [`Engine`].
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(engine: Arc<Engine>, config: &ServerConfig) -> Self {
        let state = AppState {
            engine,
            max_body_size: config.limits.max_body_size,
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Bind a TCP listener, naming the address on failure.
pub async fn bind(address: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Buffer the body, then run the request through the engine.
///
/// Bodies over the limit get `413`; bodies that fail to arrive get `400`.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let mut body_request = Request::new(body);
    *body_request.extensions_mut() = parts.extensions.clone();

    let bytes = match Bytes::from_request(body_request, &state).await {
        Ok(bytes) => bytes,
        Err(rejection) => {
            tracing::warn!(
                path = %parts.uri.path(),
                limit = state.max_body_size,
                status = rejection.status().as_u16(),
                error = %rejection.body_text(),
                "Request body rejected"
            );
            return (rejection.status(), rejection.body_text()).into_response();
        }
    };

    state
        .engine
        .serve(Request::from_parts(parts, bytes))
        .map(Body::from)
}
