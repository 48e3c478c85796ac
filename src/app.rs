use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    routing::{get, post, IntoMakeService},
    BoxError, Json, Router,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    constants::*,
    handlers::{
        default_route_handler, global_404_handler, ping_handler, send_otp_handler,
        verify_otp_handler,
    },
    models::GenericResponse,
    otp::OtpService,
    swagger::ApiDoc,
};

pub fn build_app(otp_service: Arc<OtpService>) -> IntoMakeService<Router> {
    tracing::debug!("Initializing the app");
    build_router(otp_service).into_make_service()
}

/// All routes of the app with the common middleware applied
pub fn build_router(otp_service: Arc<OtpService>) -> Router {
    let otp_routes = Router::new()
        .route("/send", post(send_otp_handler))
        .route("/verify", post(verify_otp_handler));
    let api_routes = Router::new()
        .route("/ping", get(ping_handler))
        .nest("/otp", otp_routes);

    Router::new()
        .route("/", get(default_route_handler))
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(global_404_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
        )
        .with_state(otp_service)
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, Json<GenericResponse>) {
    let (status, msg) = if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_owned())
    } else {
        let msg = format!("Something went wrong: {err}");
        (StatusCode::INTERNAL_SERVER_ERROR, msg)
    };
    tracing::debug!("{msg}");
    let res = GenericResponse {
        success: false,
        message: msg,
    };
    (status, Json(res))
}
