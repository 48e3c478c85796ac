use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    models::{GenericResponse, OtpErrorResponse, VerifyOtpReq},
    otp::OtpService,
    utils::{AppError, ValidatedBody},
};

/// Verify otp
///
/// Check the otp last sent to the email. An otp can be verified once
/// and allows three wrong attempts.
#[utoipa::path(
    post,
    path = "/api/v1/otp/verify",
    request_body = VerifyOtpReq,
    responses(
        (status = 200, description = "Otp verified", body = GenericResponse),
        (status = 400, description = "Invalid request body or wrong otp", body = OtpErrorResponse),
        (status = 403, description = "Too many wrong attempts", body = OtpErrorResponse),
        (status = 404, description = "No live otp for the email", body = OtpErrorResponse),
        (status = 500, description = "Internal server error", body = GenericResponse),
    ),
    tag = "OTP API"
)]
pub async fn verify_otp_handler(
    State(otp_service): State<Arc<OtpService>>,
    ValidatedBody(body): ValidatedBody<VerifyOtpReq>,
) -> Result<Json<GenericResponse>, AppError> {
    otp_service
        .verify(&body.email, &body.otp)
        .await
        .map_err(AppError::Otp)?;
    let res = GenericResponse {
        success: true,
        message: "Otp verified".to_owned(),
    };
    Ok(Json(res))
}
