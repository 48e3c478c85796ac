pub(crate) mod error_handler;
pub(crate) mod misc;
pub(crate) mod validation;

pub use error_handler::AppError;
pub use misc::*;
pub use validation::validate_otp_code;
pub use validation::ValidatedBody;
