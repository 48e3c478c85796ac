use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::{constants::*, utils::env_or};

/// Delivers an otp to its address out of band
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns false when the otp could not be handed over for delivery
    async fn send(&self, address: &str, code: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct OtpMessage<'a> {
    to: &'a str,
    subject: &'a str,
    code: &'a str,
}

/// Posts the otp as JSON to the mail delivery gateway
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_owned(),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("NOTIFIER_URL").context("NOTIFIER_URL not found in .env file")?;
        let timeout = env_or("NOTIFIER_TIMEOUT_SECS", NOTIFIER_TIMEOUT_SECS);
        Self::new(&url, Duration::from_secs(timeout))
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, address: &str, code: &str) -> bool {
        let message = OtpMessage {
            to: address,
            subject: OTP_MAIL_SUBJECT,
            code,
        };
        match self.client.post(&self.url).json(&message).send().await {
            Ok(res) if res.status().is_success() => true,
            Ok(res) => {
                tracing::warn!("Notifier rejected otp: {}", res.status());
                false
            }
            Err(err) => {
                tracing::warn!("Unable to reach notifier: {err}");
                false
            }
        }
    }
}
