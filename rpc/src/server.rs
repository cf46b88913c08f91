//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use fairdraw_draw::{DrawService, GiveawayService};
use fairdraw_store::Store;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::RpcError;
use crate::handlers;
use crate::Authenticator;

/// Shared state behind every handler.
pub struct RpcState {
    pub draws: Arc<DrawService>,
    pub giveaways: Arc<GiveawayService>,
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn Authenticator>,
}

/// Answer unsupported methods with the JSON envelope instead of an empty 405.
fn strict(route: MethodRouter<Arc<RpcState>>) -> MethodRouter<Arc<RpcState>> {
    route.fallback(handlers::method_not_allowed)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub fn router(state: Arc<RpcState>) -> Router {
    Router::new()
        .route("/select-winners", strict(post(handlers::select_winners)))
        .route(
            "/giveaways",
            strict(post(handlers::create_giveaway).get(handlers::list_giveaways)),
        )
        .route("/giveaways/:id", strict(get(handlers::get_giveaway)))
        .route(
            "/giveaways/:id/participants",
            strict(get(handlers::list_participants)),
        )
        .route("/giveaways/:id/join", strict(post(handlers::join_giveaway)))
        .route("/giveaways/:id/status", strict(post(handlers::change_status)))
        .route("/giveaways/:id/audit", strict(get(handlers::audit_draw)))
        .route("/health", strict(get(handlers::health)))
        .route("/metrics", strict(get(handlers::metrics)))
        .fallback(handlers::not_found)
        .layer(cors())
        .with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    state: Arc<RpcState>,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: Arc<RpcState>) -> Self {
        Self { addr, state }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        info!("RPC server listening on {}", self.addr);
        axum::serve(listener, router(Arc::clone(&self.state)))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
