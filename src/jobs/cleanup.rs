use std::{sync::Arc, time::Duration};
use tokio::time::interval;

use crate::{
    constants::*,
    otp::OtpStore,
    utils::{env_or, get_epoch_ms},
};

/// Retention period of expired otp, read from `OTP_RETENTION_DAYS`
pub fn otp_retention() -> Duration {
    let days = env_or("OTP_RETENTION_DAYS", OTP_RETENTION_DAYS);
    Duration::from_secs(days * 24 * 3600)
}

/// This function periodically deletes the expired OTP from database
pub async fn cleanup_job(store: Arc<dyn OtpStore>, retention: Duration) {
    tracing::debug!("initializing cleanup scheduler job");
    // CLEANUP_JOB_INTERVAL is mentioned in seconds
    let mut interval = interval(Duration::from_secs(CLEANUP_JOB_INTERVAL));
    loop {
        interval.tick().await;
        match delete_expired_otp(store.as_ref(), get_epoch_ms(), retention).await {
            Ok(deleted) => tracing::debug!("Deleted {deleted} expired otp"),
            Err(err) => tracing::error!("Error in otp deletion: {:?}", err),
        }
    }
}

/// This function deletes the OTP which expired longer than the retention period ago
pub async fn delete_expired_otp(
    store: &dyn OtpStore,
    now: u64,
    retention: Duration,
) -> anyhow::Result<u64> {
    let retention = u64::try_from(retention.as_millis()).unwrap_or(u64::MAX);
    let cut_off = now.saturating_sub(retention);
    store.delete_expired_before(cut_off).await
}
