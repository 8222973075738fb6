//! idrec-svc library - Identity Reconciliation service
//!
//! Consolidates contact submissions sharing an email or phone number into
//! clusters with a single primary contact, exposed over HTTP.

use std::sync::Arc;

use axum::Router;
use idrec_common::ContactStore;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod error;
pub mod reconcile;

pub use reconcile::{ConsolidatedView, Reconciler};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Reconciler,
    /// Database pool, when the store is SQLite-backed (used by /health)
    pub db: Option<SqlitePool>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn ContactStore>, db: Option<SqlitePool>) -> Self {
        Self {
            reconciler: Reconciler::new(store),
            db,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/", get(api::serve_index))
        .route("/identify", post(api::identify_contact))
        .route("/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
