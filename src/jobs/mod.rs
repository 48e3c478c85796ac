use std::{sync::Arc, time::Duration};

use self::cleanup::cleanup_job;
use crate::otp::OtpStore;

pub mod cleanup;

pub fn spawn_all_jobs(store: Arc<dyn OtpStore>, retention: Duration) {
    // spawn job to cleanup expired otp
    tokio::spawn(async move {
        cleanup_job(store, retention).await;
    });
}
