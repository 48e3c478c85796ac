use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest},
    http::Request,
    Json,
};
use validator::{Validate, ValidationError};

use super::AppError;
use crate::otp::hashing::is_otp_format;

/// Custom validator function to check the otp sent by the client
pub fn validate_otp_code(otp: &str) -> Result<(), ValidationError> {
    if !is_otp_format(otp) {
        let mut err = ValidationError::new("otp");
        err.message = Some(format!("Otp must be 6 digits. Invalid otp received: {otp}").into());
        return Err(err);
    }
    Ok(())
}

/// JSON body extractor which also runs the validator rules of the body
pub struct ValidatedBody<T>(pub T);

#[async_trait]
impl<S, B, T> FromRequest<S, B> for ValidatedBody<T>
where
    B: Send + 'static,
    S: Send + Sync,
    T: Validate + Send,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| AppError::BadRequestErr(err.body_text()))?;
        data.validate()
            .map_err(|err| AppError::BadRequestErr(err.to_string()))?;
        Ok(Self(data))
    }
}
