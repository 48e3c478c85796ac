use thiserror::Error;

/// Outcome of a failed issue or verify call.
/// Everything except `Store` is a domain condition the caller can recover from.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Email address is empty")]
    InvalidAddress,

    #[error("Please wait {retry_after_secs} seconds before requesting a new otp")]
    Throttled { retry_after_secs: u64 },

    #[error("Unable to deliver the otp, please try again")]
    Delivery,

    #[error("Otp not found or expired, please request a new one")]
    NotFoundOrExpired,

    #[error("Too many failed attempts, please request a new otp")]
    AttemptsExhausted,

    #[error("Invalid otp, {remaining_attempts} attempts remaining")]
    InvalidCode { remaining_attempts: u32 },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
