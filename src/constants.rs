pub const DEFAULT_PORT: u16 = 3000;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MONGO_MIN_POOL_SIZE: u32 = 5;
pub const MONGO_MAX_POOL_SIZE: u32 = 10;
pub const MONGO_CONN_TIMEOUT: u64 = 10;
pub const NOTIFIER_TIMEOUT_SECS: u64 = 10;

pub const OTP_MIN_VALUE: u32 = 100_000;
pub const OTP_MAX_VALUE: u32 = 999_999;
pub const OTP_LENGTH: usize = 6;
pub const OTP_VERIFICATION_VALIDITY_MINS: u64 = 5;
pub const OTP_SIGNUP_VALIDITY_MINS: u64 = 10;
pub const OTP_RESEND_COOLDOWN_SECS: u64 = 60;
pub const OTP_MAX_ATTEMPTS: u32 = 3;
pub const OTP_HASH_COST: u32 = 10;
// bcrypt refuses costs outside this range
pub const OTP_HASH_COST_MIN: u32 = 4;
pub const OTP_HASH_COST_MAX: u32 = 31;
pub const OTP_RETENTION_DAYS: u64 = 7;
pub const OTP_MAIL_SUBJECT: &str = "Your verification code";

// pub const CLEANUP_JOB_INTERVAL: u64 = 60;
pub const CLEANUP_JOB_INTERVAL: u64 = 24 * 60 * 60;

pub const DEFAULT_DB_NAME: &str = "venuebooking";
pub const COLL_OTP: &str = "otps";
