//! HTTP surface: routing, shared state and request handling.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::ConnectionProvider;

pub mod docs;
pub mod handlers;
pub mod payload;
pub mod requests;
pub mod statements;

/// State shared by every request: the connection provider
pub struct AppState<P> {
    provider: Arc<P>,
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self { provider: Arc::clone(&self.provider) }
    }
}

impl<P: ConnectionProvider> AppState<P> {
    pub fn new(provider: P) -> Self {
        Self { provider: Arc::new(provider) }
    }

    pub fn from_shared(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// Build the application router
///
/// Unknown paths fall through to axum's default 404.
pub fn router<P: ConnectionProvider>(state: AppState<P>) -> Router {
    Router::new()
        .route(
            "/agent",
            post(handlers::create_agent::<P>)
                .put(handlers::rename_agent::<P>)
                .patch(handlers::update_agent_terms::<P>),
        )
        .route("/agent/:id", delete(handlers::delete_agent::<P>))
        .route("/agents", get(handlers::list_agents::<P>))
        .route("/customers", get(handlers::list_customers::<P>))
        .route("/customer/:id", get(handlers::customer_by_code::<P>))
        .route("/company", get(handlers::list_company::<P>))
        .route("/daysorder", get(handlers::list_days_orders::<P>))
        .route("/despatch", get(handlers::list_despatch::<P>))
        .route("/foods", get(handlers::list_foods::<P>))
        .route("/orders", get(handlers::orders_by_amount::<P>))
        .route("/health", get(handlers::health::<P>))
        .merge(docs::routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
