use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    models::{GenericResponse, OtpErrorResponse},
    otp::OtpError,
};

#[derive(Debug)]
pub enum AppError {
    BadRequestErr(String),
    NotFound(String),
    Otp(OtpError),
    AnyError(anyhow::Error),
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self::AnyError(err.into())
    }
}

fn generic_response(status: StatusCode, msg: String) -> Response {
    let response = GenericResponse {
        success: false,
        message: msg,
    };
    (status, Json(response)).into_response()
}

fn otp_response(err: OtpError) -> Response {
    let mut response = OtpErrorResponse {
        success: false,
        message: err.to_string(),
        retry_after: None,
        remaining_attempts: None,
    };
    match err {
        OtpError::InvalidAddress => (StatusCode::BAD_REQUEST, Json(response)).into_response(),
        OtpError::Throttled { retry_after_secs } => {
            tracing::debug!("Too many requests: {}", response.message);
            response.retry_after = Some(retry_after_secs);
            let headers = [(header::RETRY_AFTER, retry_after_secs.to_string())];
            (StatusCode::TOO_MANY_REQUESTS, headers, Json(response)).into_response()
        }
        OtpError::Delivery => (StatusCode::BAD_GATEWAY, Json(response)).into_response(),
        OtpError::NotFoundOrExpired => (StatusCode::NOT_FOUND, Json(response)).into_response(),
        OtpError::AttemptsExhausted => (StatusCode::FORBIDDEN, Json(response)).into_response(),
        OtpError::InvalidCode { remaining_attempts } => {
            response.remaining_attempts = Some(remaining_attempts);
            (StatusCode::BAD_REQUEST, Json(response)).into_response()
        }
        OtpError::Store(err) => AppError::AnyError(err).into_response(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequestErr(msg) => {
                tracing::debug!("Bad request: {}", msg);
                generic_response(StatusCode::BAD_REQUEST, msg)
            }
            Self::NotFound(msg) => {
                tracing::debug!("Not Found: {}", msg);
                generic_response(StatusCode::NOT_FOUND, msg)
            }
            Self::Otp(err) => otp_response(err),
            Self::AnyError(err) => {
                let msg = format!("Something went wrong: {err}");
                tracing::error!("{msg}");
                generic_response(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}
