use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{admin, csv, handlers, leads, status};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Leads
        .route("/leads", post(leads::create_lead))
        .route("/leads", get(leads::list_leads))
        .route("/leads/{id}", get(leads::get_lead))
        .route("/leads/{id}/status", put(leads::update_status))
        // CSV import
        .route("/csv/process", post(csv::process_csv))
        // Pipeline statistics
        .route("/status", get(status::get_status))
        // Administration
        .route("/reset", post(admin::reset))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
