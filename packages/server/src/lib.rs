// Recipe Finder - moderation core
//
// Recipe submissions move through a review queue into the public recipe
// collection. Admin decisions are atomic store units, logged for audit, and
// followed by best-effort push notifications.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
