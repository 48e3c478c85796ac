pub mod clock;
pub mod error;
pub mod hashing;
pub mod memory_store;
pub mod notifier;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::OtpError;
pub use memory_store::MemoryOtpStore;
pub use notifier::{HttpNotifier, Notifier};
pub use service::{OtpService, OtpSettings};
pub use store::{InsertOutcome, MongoOtpStore, OtpStore};
