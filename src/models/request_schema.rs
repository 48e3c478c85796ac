use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::validate_otp_code;

use super::OtpPurpose;

/// request body schema for sending an otp
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SendOtpReq {
    #[validate(email)]
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<OtpPurpose>,
}

/// request body schema for verifying an otp
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpReq {
    #[validate(email)]
    pub email: String,

    #[validate(custom(function = "validate_otp_code"))]
    pub otp: String,
}
