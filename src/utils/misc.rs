use chrono::Utc;
use rand::{thread_rng, Rng};
use std::str::FromStr;

use crate::constants::*;

/// Get EPOCH timestamp in milliseconds
pub fn get_epoch_ms() -> u64 {
    let ms = Utc::now().timestamp_millis();
    u64::try_from(ms).unwrap_or_default()
}

/// Convert an EPOCH timestamp into the signed integer stored by mongodb
pub fn to_bson_ts(ts: u64) -> i64 {
    i64::try_from(ts).unwrap_or(i64::MAX)
}

/// Generate a numeric OTP uniformly sampled over the six digit range
pub fn generate_otp() -> String {
    let mut rng = thread_rng();
    let otp = rng.gen_range(OTP_MIN_VALUE..=OTP_MAX_VALUE);
    otp.to_string()
}

/// Read an environment variable and parse it,
/// falling back to the default when it is missing or malformed
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn test_get_epoch_ms() {
        let d = Duration::from_millis(20);
        let t1 = get_epoch_ms();
        thread::sleep(d);
        let t2 = get_epoch_ms();
        assert_eq!(t1 > 0, true);
        assert_eq!(t1 + 20 <= t2, true);
    }

    #[test]
    fn test_to_bson_ts() {
        assert_eq!(to_bson_ts(0), 0);
        assert_eq!(to_bson_ts(1_700_000_000_000), 1_700_000_000_000);
        assert_eq!(to_bson_ts(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_generate_otp_six_len() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_LENGTH);
            assert_eq!(otp.chars().all(|ch| ch.is_ascii_digit()), true);
            assert_ne!(otp.chars().next(), Some('0'));
        }
    }

    #[test]
    fn test_generate_otp_random() {
        let otp1 = generate_otp();
        let otp2 = generate_otp();
        let otp3 = generate_otp();
        assert_eq!(otp1 == otp2 && otp2 == otp3, false);
    }

    #[test]
    fn test_env_or() {
        std::env::set_var("VENUE_TEST_ENV_OR_NUM", "42");
        std::env::set_var("VENUE_TEST_ENV_OR_BAD", "forty-two");
        assert_eq!(env_or("VENUE_TEST_ENV_OR_NUM", 7_u32), 42);
        assert_eq!(env_or("VENUE_TEST_ENV_OR_BAD", 7_u32), 7);
        assert_eq!(env_or("VENUE_TEST_ENV_OR_MISSING", 7_u32), 7);
    }
}
