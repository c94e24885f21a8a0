//! Recipe content shared by the submission and publication stores.

pub mod models;

pub use models::*;
