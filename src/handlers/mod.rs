pub mod default;
pub mod global_404;
pub mod otp;
pub mod ping;

pub use default::default_route_handler;
pub use global_404::global_404_handler;
pub use otp::send::send_otp_handler;
pub use otp::verify::verify_otp_handler;
pub use ping::ping_handler;
