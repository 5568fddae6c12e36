use crate::infrastructure::http::controllers::{
    health, leads, messages, professionals, recovery, webhooks,
};
use crate::infrastructure::http::middleware::AppState;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/messages", post(messages::post_message))
        .route("/api/leads", get(leads::list_leads))
        .route("/api/leads/:id", get(leads::get_lead))
        .route("/api/professionals", get(professionals::list_professionals))
        .route("/api/recovery/:sweep/run", post(recovery::run_sweep))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_origin(Any),
        );

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/webhooks/whatsapp",
            get(webhooks::verify_webhook).post(webhooks::receive_webhook),
        )
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
