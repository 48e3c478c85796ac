use axum::{http::StatusCode, Json};

use crate::models::GenericResponse;

/// Default route
///
/// Returns a JSON response with 200 status code
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Server is up", body = GenericResponse)
    ),
    tag = "Health API"
)]
pub async fn default_route_handler() -> (StatusCode, Json<GenericResponse>) {
    let response = GenericResponse {
        success: true,
        message: "Server is running".to_owned(),
    };
    (StatusCode::OK, Json(response))
}
