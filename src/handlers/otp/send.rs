use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    models::{GenericResponse, OtpErrorResponse, SendOtpReq},
    otp::OtpService,
    utils::{AppError, ValidatedBody},
};

/// Send otp
///
/// Generate an otp for the email and deliver it by mail.
/// A new otp can be requested only after the resend cooldown has passed.
#[utoipa::path(
    post,
    path = "/api/v1/otp/send",
    request_body = SendOtpReq,
    responses(
        (status = 200, description = "Otp sent to the email", body = GenericResponse),
        (status = 400, description = "Invalid request body", body = GenericResponse),
        (status = 429, description = "Otp requested again before the cooldown", body = OtpErrorResponse),
        (status = 502, description = "Otp could not be delivered", body = OtpErrorResponse),
        (status = 500, description = "Internal server error", body = GenericResponse),
    ),
    tag = "OTP API"
)]
pub async fn send_otp_handler(
    State(otp_service): State<Arc<OtpService>>,
    ValidatedBody(body): ValidatedBody<SendOtpReq>,
) -> Result<Json<GenericResponse>, AppError> {
    let purpose = body.purpose.unwrap_or_default();
    otp_service
        .issue_for(&body.email, purpose)
        .await
        .map_err(AppError::Otp)?;
    let res = GenericResponse {
        success: true,
        message: "Otp sent".to_owned(),
    };
    Ok(Json(res))
}
