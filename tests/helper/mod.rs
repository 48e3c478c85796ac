pub mod helper;

pub use helper::build_get_request;
pub use helper::build_post_request;
pub use helper::read_body;
pub use helper::CapturingNotifier;
pub use helper::TestApp;
