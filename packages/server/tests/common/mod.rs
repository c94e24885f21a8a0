// Common test utilities
#![allow(dead_code)]

pub mod api;
pub mod fixtures;
pub mod harness;
pub mod push_mock;

#[allow(unused_imports)]
pub use api::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use harness::*;
#[allow(unused_imports)]
pub use push_mock::*;
