use axum::{http::Uri, response::IntoResponse};

use crate::utils::AppError;

/// Fallback for every unknown route
pub async fn global_404_handler(uri: Uri) -> impl IntoResponse {
    let msg = format!("Route `{}` does not exist", uri);
    AppError::NotFound(msg)
}
