pub mod core;
pub mod watch;

pub use self::core::*;
pub use watch::{watch_my_submissions, watch_queue};
