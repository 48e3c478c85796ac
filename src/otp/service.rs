use std::{sync::Arc, time::Duration};

use super::{
    clock::Clock,
    error::OtpError,
    hashing::{hash_code, verify_code},
    notifier::Notifier,
    store::{InsertOutcome, OtpStore},
};
use crate::{
    constants::*,
    models::{OtpPurpose, OtpRecord},
    utils::{env_or, generate_otp},
};

#[derive(Debug, Clone)]
pub struct OtpSettings {
    pub resend_cooldown: Duration,
    pub max_attempts: u32,
    pub hash_cost: u32,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            resend_cooldown: Duration::from_secs(OTP_RESEND_COOLDOWN_SECS),
            max_attempts: OTP_MAX_ATTEMPTS,
            hash_cost: OTP_HASH_COST,
        }
    }
}

impl OtpSettings {
    pub fn from_env() -> Self {
        let cooldown = env_or("OTP_RESEND_COOLDOWN_SECS", OTP_RESEND_COOLDOWN_SECS);
        Self {
            resend_cooldown: Duration::from_secs(cooldown),
            max_attempts: env_or("OTP_MAX_ATTEMPTS", OTP_MAX_ATTEMPTS),
            hash_cost: bounded_hash_cost(env_or("OTP_HASH_COST", OTP_HASH_COST)),
        }
    }

    fn resend_cooldown_ms(&self) -> u64 {
        u64::try_from(self.resend_cooldown.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Issues otp codes to email addresses and verifies them.
///
/// A record is live while it is neither consumed nor expired. Only the newest
/// live record of an address is ever matched against. Callers update any
/// dependent state (e.g. marking the account verified) after `verify` succeeds.
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    settings: OtpSettings,
}

impl OtpService {
    pub fn new(
        store: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: OtpSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            settings,
        }
    }

    /// Issue an otp valid for the duration of the given flow
    pub async fn issue_for(&self, address: &str, purpose: OtpPurpose) -> Result<(), OtpError> {
        let ttl = Duration::from_secs(purpose.ttl_minutes() * 60);
        self.create_and_send(address, ttl, Some(purpose)).await
    }

    /// Issue an otp valid for `ttl_minutes`
    pub async fn issue(&self, address: &str, ttl_minutes: u64) -> Result<(), OtpError> {
        let ttl = Duration::from_secs(ttl_minutes.saturating_mul(60));
        self.create_and_send(address, ttl, None).await
    }

    async fn create_and_send(
        &self,
        address: &str,
        ttl: Duration,
        purpose: Option<OtpPurpose>,
    ) -> Result<(), OtpError> {
        let address = normalize_address(address)?;
        let now = self.clock.now_millis();
        let cooldown = self.settings.resend_cooldown_ms();
        // skips hashing for the common throttled case
        if let Some(live) = self.store.find_live_by_address(&address, now).await? {
            if now.saturating_sub(live.issued_at) < cooldown {
                return Err(throttled(&address, &live, now, cooldown));
            }
        }

        let code = generate_otp();
        let code_hash = hash_code(&code, self.settings.hash_cost).await?;
        let record = OtpRecord::new(&address, code_hash, now, ttl).with_purpose(purpose);
        // concurrent issues for the address may have inserted since the lookup
        let throttle_since = now.saturating_sub(cooldown);
        let id = match self
            .store
            .insert_unless_throttled(&record, throttle_since)
            .await?
        {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::Throttled(live) => {
                return Err(throttled(&address, &live, now, cooldown));
            }
        };

        if !self.notifier.send(&address, &code).await {
            tracing::warn!("Otp delivery failed, discarding record {id}");
            // an undelivered record would throttle the next attempt
            self.store.delete_by_id(&id).await?;
            return Err(OtpError::Delivery);
        }

        tracing::debug!("Otp issued for {address}");
        Ok(())
    }

    /// Match `code` against the newest live otp of the address
    pub async fn verify(&self, address: &str, code: &str) -> Result<(), OtpError> {
        let address = normalize_address(address)?;
        let now = self.clock.now_millis();
        let record = self
            .store
            .find_live_by_address(&address, now)
            .await?
            .ok_or(OtpError::NotFoundOrExpired)?;
        let id = record
            .id
            .ok_or_else(|| anyhow::anyhow!("Otp record for {address} has no id"))?;

        if record.attempts >= self.settings.max_attempts {
            tracing::debug!("Otp attempts exhausted for {address}");
            return Err(OtpError::AttemptsExhausted);
        }

        if !verify_code(code, &record.code_hash).await? {
            let updated = self
                .store
                .increment_attempts(&id)
                .await?
                .ok_or(OtpError::NotFoundOrExpired)?;
            let remaining_attempts = self.settings.max_attempts.saturating_sub(updated.attempts);
            tracing::debug!("Invalid otp for {address}, {remaining_attempts} attempts left");
            return Err(OtpError::InvalidCode { remaining_attempts });
        }

        // a concurrent verify may have consumed it in between
        if !self.store.mark_consumed(&id, now).await? {
            return Err(OtpError::NotFoundOrExpired);
        }
        tracing::debug!("Otp verified for {address}");
        Ok(())
    }
}

fn throttled(address: &str, live: &OtpRecord, now: u64, cooldown: u64) -> OtpError {
    let elapsed = now.saturating_sub(live.issued_at);
    let retry_after_secs = cooldown.saturating_sub(elapsed).div_ceil(1000).max(1);
    tracing::debug!("Otp resend for {address} throttled for {retry_after_secs}s");
    OtpError::Throttled { retry_after_secs }
}

fn bounded_hash_cost(cost: u32) -> u32 {
    let bounded = cost.clamp(OTP_HASH_COST_MIN, OTP_HASH_COST_MAX);
    if bounded != cost {
        tracing::warn!("OTP_HASH_COST {cost} is out of range, using {bounded}");
    }
    bounded
}

fn normalize_address(address: &str) -> Result<String, OtpError> {
    let address = address.trim().to_lowercase();
    if address.is_empty() {
        return Err(OtpError::InvalidAddress);
    }
    Ok(address)
}
