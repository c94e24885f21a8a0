//! Test harness with testcontainers for integration testing.
//!
//! Uses one shared Postgres container per test binary. The container and
//! migrations are initialized on first use, then reused.

use anyhow::{Context, Result};
use recipes_core::common::UserId;
use recipes_core::kernel::{
    ChangeHub, NotificationQueue, PostgresAccountStore, PostgresAdminDirectory,
    PostgresRecipeStore, ServerDeps,
};
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use super::unique_user;

pub const TEST_ADMIN_EMAIL: &str = "admin@recipes.test";

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Postgres-backed `ServerDeps` plus a fresh admin user.
///
/// Tests share one database, so every harness gets its own admin id and
/// tests should only assert on records they created.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut TestHarness) {
///     let deps = &ctx.deps;
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub deps: ServerDeps,
    pub admin_id: UserId,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        // Nobody drains the queue; enqueueing logs and drops.
        let (notifications, _) = NotificationQueue::new();
        let accounts = Arc::new(PostgresAccountStore::new(db_pool.clone()));
        let deps = ServerDeps::new(
            Arc::new(PostgresRecipeStore::new(db_pool.clone())),
            accounts.clone(),
            Arc::new(PostgresAdminDirectory::new(
                db_pool.clone(),
                vec![TEST_ADMIN_EMAIL.to_string()],
            )),
            notifications,
            ChangeHub::new(),
        );

        let admin_id = unique_user("admin");
        recipes_core::kernel::BaseAccountStore::upsert_profile(
            accounts.as_ref(),
            &admin_id,
            Some(TEST_ADMIN_EMAIL),
        )
        .await
        .context("Failed to create admin profile")?;

        Ok(Self {
            db_pool,
            deps,
            admin_id,
        })
    }
}
