//! HTTP server wiring for LiveEdit (API routes, admin gate, shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for action, slot and view endpoints.
pub mod handlers;

pub use liveedit_core::{config, models, AppError, Config, SlotEditor, DEFAULT_PORT};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; frame-ancestors 'none'; base-uri 'none'";

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub editor: Arc<SlotEditor>,
}

impl AppState {
    /// Construct shared application state, selecting the persistence backend
    /// from `config`.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    ///
    /// # Returns
    /// A new [`AppState`].
    ///
    /// # Errors
    /// Returns an error when hosted GitHub settings are malformed.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let editor = SlotEditor::from_config(&config)?;
        Ok(Self::with_editor(config, editor))
    }

    /// Construct shared application state around an existing editor.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `editor`: Editor wired to its persistence backend.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn with_editor(config: Config, editor: SlotEditor) -> Self {
        Self {
            config: Arc::new(config),
            editor: Arc::new(editor),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from the `BIND` override and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let requested = std::env::var("BIND").ok();
    bind_address_for(config.port, requested.as_deref(), allow_public_access)
}

fn bind_address_for(port: u16, requested: Option<&str>, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], port));
    let requested = match requested {
        Some(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        None => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let methods = [Method::GET, Method::POST];
    let cors = if allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_str(&format!("http://localhost:{}", cors_port))
                    .unwrap_or_else(|_| HeaderValue::from_static("http://localhost")),
                HeaderValue::from_str(&format!("http://127.0.0.1:{}", cors_port))
                    .unwrap_or_else(|_| HeaderValue::from_static("http://127.0.0.1")),
            ])
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
    };

    let actions = Router::new()
        .route("/hero-text", post(handlers::actions::hero_text))
        .route(
            "/mission-positions",
            post(handlers::actions::mission_positions),
        )
        .route("/vial-position", post(handlers::actions::vial_position))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::auth::require_admin,
        ));

    Router::new()
        .nest("/api/actions", actions)
        .route("/api/slots/:target", get(handlers::slots::read_slots))
        .route("/api/views", get(handlers::slots::list_views))
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(state.config.max_body_size))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
