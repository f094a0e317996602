//! Per-test databases inside one shared `PostgreSQL` container.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool, query};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};

pub(super) const SUPERUSER: &str = "rebound_test";
pub(super) const SUPERUSER_PASSWORD: &str = "rebound_test_password";

static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

/// Names of databases waiting to be dropped.
static DROP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

/// Database names are interpolated into DDL, so only plain identifiers are accepted.
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    name.len() <= 63
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(SUPERUSER)
        .with_password(SUPERUSER_PASSWORD)
        .with_db_name("rebound_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

fn host() -> String {
    std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string())
}

async fn server_url(database: &str) -> String {
    let container = POSTGRES_CONTAINER.get_or_init(start_container).await;

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    format!(
        "postgresql://{SUPERUSER}:{SUPERUSER_PASSWORD}@{}:{port}/{database}",
        host()
    )
}

async fn spawn_dropper() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if let Err(error) = drop_database(&name).await {
                eprintln!("Failed to drop test database '{name}': {error}");
            }
        }
    });

    sender
}

async fn drop_database(name: &str) -> Result<(), sqlx::Error> {
    if !is_plain_identifier(name) {
        return Ok(());
    }

    let mut conn = PgConnection::connect(&server_url("postgres").await).await?;

    query(&format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// A freshly migrated database, dropped in the background once the value goes away.
///
/// Services commit normally; isolation comes from every test having its own database.
#[derive(Debug)]
pub struct TestDb {
    pool: PgPool,
    pub name: String,

    /// Superuser URL for this database, used to derive other roles' URLs.
    pub(super) url: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = DROP_SENDER.get()
            && sender.send(self.name.clone()).is_err()
        {
            eprintln!("Test database '{}' was not dropped", self.name);
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        DROP_SENDER.get_or_init(spawn_dropper).await;

        let name = format!("rebound_test_{}", uuid::Uuid::now_v7().simple());

        assert!(is_plain_identifier(&name), "bad test database name {name}");

        let mut conn = PgConnection::connect(&server_url("postgres").await)
            .await
            .expect("Failed to connect to postgres database");

        query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close().await.expect("Failed to close admin connection");

        let url = server_url(&name).await;

        let pool = PgPool::connect(&url)
            .await
            .expect("Failed to create pool for test database");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool, name, url }
    }

    /// Superuser pool; bypasses row-level security.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_are_accepted() {
        assert!(is_plain_identifier("rebound_test_0190"));
        assert!(is_plain_identifier("_leading_underscore"));
    }

    #[test]
    fn unsafe_identifiers_are_rejected() {
        assert!(!is_plain_identifier(""));
        assert!(!is_plain_identifier("1starts_with_digit"));
        assert!(!is_plain_identifier("has\"quote"));
        assert!(!is_plain_identifier("has-hyphen"));
        assert!(!is_plain_identifier(&"a".repeat(64)));
    }

    #[tokio::test]
    async fn migrated_database_has_order_tables() {
        let test_db = TestDb::new().await;

        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_name IN ('coupons', 'orders', 'coupon_usages')",
        )
        .fetch_one(test_db.pool())
        .await
        .expect("Failed to query information schema");

        assert_eq!(count, 3);
    }
}
