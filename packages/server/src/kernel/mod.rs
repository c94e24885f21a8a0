//! Kernel module - server infrastructure and dependencies.

pub mod admin_directory;
pub mod deps;
pub mod notifications;
pub mod postgres_store;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use admin_directory::PostgresAdminDirectory;
pub use deps::ServerDeps;
pub use notifications::{
    run_notification_worker, ExpoNotificationSink, Notification, NotificationKind,
    NotificationQueue,
};
pub use postgres_store::{PostgresAccountStore, PostgresRecipeStore};
pub use stream_hub::{ChangeEvent, ChangeHub, Collection, Snapshots};
pub use test_dependencies::TestDependencies;
pub use traits::*;
