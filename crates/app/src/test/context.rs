//! Test context for service-level integration tests.

use sqlx::{Connection, PgConnection, PgPool, query};

use crate::{
    database::Db,
    domain::{coupons::PgCouponsService, orders::PgOrdersService, users::UserUuid},
    payments::{MockPaymentProvider, SignatureVerifier},
};

use super::{
    db::{SUPERUSER, SUPERUSER_PASSWORD, TestDb},
    helpers::TEST_PROVIDER_SECRET,
};

/// Non-superuser role the user-scoped pool connects as, so RLS policies apply.
const APP_ROLE: &str = "rebound_app_test";
const APP_ROLE_PASSWORD: &str = "rebound_app_test_pass";

pub(crate) struct TestContext {
    pub db: TestDb,
    pub user_uuid: UserUuid,
    pub coupons: PgCouponsService,
    app_db: Db,
    service_db: Db,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;

        let app_db = Db::new(Self::setup_app_pool(&test_db).await);
        let service_db = Db::new(test_db.pool().clone());

        Self {
            coupons: PgCouponsService::new(app_db.clone(), service_db.clone()),
            user_uuid: UserUuid::new(),
            db: test_db,
            app_db,
            service_db,
        }
    }

    /// Orders service backed by `provider` and signing with the test secret.
    pub fn orders(&self, provider: MockPaymentProvider) -> PgOrdersService<MockPaymentProvider> {
        PgOrdersService::new(
            self.app_db.clone(),
            self.service_db.clone(),
            provider,
            SignatureVerifier::new(TEST_PROVIDER_SECRET.as_bytes())
                .expect("HMAC accepts keys of any length"),
        )
    }

    /// Create the restricted role (once per server) and connect to the test database as it.
    async fn setup_app_pool(test_db: &TestDb) -> PgPool {
        let su_url = &test_db.url;

        let server_url = su_url
            .rsplit_once('/')
            .map_or_else(|| su_url.clone(), |(base, _)| format!("{base}/postgres"));

        let mut server_conn = PgConnection::connect(&server_url)
            .await
            .expect("Failed to connect to postgres database for role setup");

        // Parallel tests race to create the role; "already exists" either way is fine.
        let created = query(&format!(
            "CREATE ROLE {APP_ROLE} WITH LOGIN PASSWORD '{APP_ROLE_PASSWORD}' \
             NOSUPERUSER NOCREATEDB NOCREATEROLE NOBYPASSRLS"
        ))
        .execute(&mut server_conn)
        .await;

        match created {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref e))
                if matches!(e.code().as_deref(), Some("42710" | "23505")) => {}
            Err(error) => panic!("Failed to create app role: {error}"),
        }

        query(&format!(
            "GRANT CONNECT ON DATABASE \"{}\" TO {APP_ROLE}",
            test_db.name
        ))
        .execute(&mut server_conn)
        .await
        .expect("Failed to grant CONNECT on test database");

        server_conn
            .close()
            .await
            .expect("Failed to close server connection");

        let mut db_conn = PgConnection::connect(su_url)
            .await
            .expect("Failed to connect to test database for privilege setup");

        for statement in [
            format!("GRANT USAGE ON SCHEMA public TO {APP_ROLE}"),
            format!("GRANT SELECT, INSERT, UPDATE ON ALL TABLES IN SCHEMA public TO {APP_ROLE}"),
        ] {
            query(&statement)
                .execute(&mut db_conn)
                .await
                .expect("Failed to grant privileges to app role");
        }

        db_conn
            .close()
            .await
            .expect("Failed to close db connection");

        let app_url = su_url.replacen(
            &format!("{SUPERUSER}:{SUPERUSER_PASSWORD}"),
            &format!("{APP_ROLE}:{APP_ROLE_PASSWORD}"),
            1,
        );

        PgPool::connect(&app_url)
            .await
            .expect("Failed to create app pool")
    }
}
