use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::handlers::*;
use crate::models::AppState;

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/control_lights", post(control_lights))
        .route("/set_properties", post(set_properties))
        .route("/get_info", get(get_info))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
