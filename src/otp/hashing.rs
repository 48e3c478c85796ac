use crate::constants::*;

/// Check that the value looks like an otp this service could have issued
pub fn is_otp_format(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.chars().all(|ch| ch.is_ascii_digit())
}

/// Hash the otp with bcrypt on the blocking thread pool
pub async fn hash_code(code: &str, cost: u32) -> anyhow::Result<String> {
    let code = code.to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(code, cost)).await??;
    Ok(hashed)
}

/// Compare a candidate otp against the stored hash.
/// Malformed candidates never match and skip the hashing cost.
pub async fn verify_code(candidate: &str, code_hash: &str) -> anyhow::Result<bool> {
    if !is_otp_format(candidate) {
        return Ok(false);
    }
    let candidate = candidate.to_owned();
    let code_hash = code_hash.to_owned();
    let matched =
        tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &code_hash)).await??;
    Ok(matched)
}
