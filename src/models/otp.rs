use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::constants::*;

/// Flow an otp is issued for. Decides how long the otp stays valid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    #[default]
    Verification,
    Signup,
}

impl OtpPurpose {
    pub fn ttl_minutes(&self) -> u64 {
        match self {
            Self::Verification => OTP_VERIFICATION_VALIDITY_MINS,
            Self::Signup => OTP_SIGNUP_VALIDITY_MINS,
        }
    }
}

/// Otp document stored in the `otps` collection.
/// Only the bcrypt hash of the code is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub address: String,
    pub code_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<OtpPurpose>,
    pub issued_at: u64,
    pub expires_at: u64,
    pub consumed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_at: Option<u64>,
    pub attempts: u32,
}

impl OtpRecord {
    pub fn new(address: &str, code_hash: String, issued_at: u64, ttl: Duration) -> Self {
        let ttl = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            id: None,
            address: address.to_owned(),
            code_hash,
            purpose: None,
            issued_at,
            expires_at: issued_at.saturating_add(ttl),
            consumed: false,
            consumed_at: None,
            attempts: 0,
        }
    }

    pub fn with_purpose(mut self, purpose: Option<OtpPurpose>) -> Self {
        self.purpose = purpose;
        self
    }

    /// Not consumed and not yet expired at `now`
    pub fn is_live(&self, now: u64) -> bool {
        !self.consumed && self.expires_at > now
    }
}
