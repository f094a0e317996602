//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        coupons::{CouponsService, PgCouponsService},
        orders::{OrdersService, PgOrdersService},
    },
    payments::{RazorpayClient, RazorpayConfig, SignatureVerifier},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("payment provider secret is not a usable signing key")]
    ProviderSecret,
}

#[derive(Clone)]
pub struct AppContext {
    pub coupons: Arc<dyn CouponsService>,
    pub orders: Arc<dyn OrdersService>,
}

impl AppContext {
    /// Build application context from database URLs and provider credentials.
    ///
    /// `app_url` must connect as a role subject to row-level security; `service_url` as
    /// the role that writes orders and redemptions on the user's behalf.
    ///
    /// # Errors
    ///
    /// Returns an error when a database connection cannot be established.
    pub async fn connect(
        app_url: &str,
        service_url: &str,
        razorpay: RazorpayConfig,
    ) -> Result<Self, AppInitError> {
        let db = Db::new(
            database::connect(app_url)
                .await
                .map_err(AppInitError::Database)?,
        );

        let service_db = Db::new(
            database::connect(service_url)
                .await
                .map_err(AppInitError::Database)?,
        );

        let verifier = SignatureVerifier::new(razorpay.key_secret.as_bytes())
            .map_err(|_| AppInitError::ProviderSecret)?;

        let provider = RazorpayClient::new(razorpay);

        Ok(Self {
            coupons: Arc::new(PgCouponsService::new(db.clone(), service_db.clone())),
            orders: Arc::new(PgOrdersService::new(db, service_db, provider, verifier)),
        })
    }
}
