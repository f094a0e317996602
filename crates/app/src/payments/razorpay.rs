//! Razorpay-compatible orders API client.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use zeroize::Zeroize;

use crate::payments::provider::{
    CreateProviderOrder, PaymentProvider, PaymentProviderError, ProviderOrder,
};

/// Provider API secret, wiped from memory on drop.
#[derive(Clone)]
pub struct ProviderSecret(String);

impl ProviderSecret {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ProviderSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProviderSecret(**redacted**)")
    }
}

impl Drop for ProviderSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Configuration for connecting to the provider.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// API base URL, e.g. `"https://api.razorpay.com"`.
    pub base_url: String,

    /// Public key identifier.
    pub key_id: String,

    /// API secret; also the key for payment signatures.
    pub key_secret: ProviderSecret,
}

/// HTTP client for the provider's orders API.
#[derive(Debug, Clone)]
pub struct RazorpayClient {
    config: RazorpayConfig,
    http: Client,
}

impl RazorpayClient {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentProvider for RazorpayClient {
    fn key_id(&self) -> String {
        self.config.key_id.clone()
    }

    async fn create_order(
        &self,
        order: CreateProviderOrder,
    ) -> Result<ProviderOrder, PaymentProviderError> {
        let response = self
            .http
            .post(self.orders_url())
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.as_str()))
            .json(&order)
            .send()
            .await?;

        parse_response(response, "create order").await
    }

    async fn find_order_by_receipt(
        &self,
        receipt: String,
    ) -> Result<Option<ProviderOrder>, PaymentProviderError> {
        let response = self
            .http
            .get(self.orders_url())
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.as_str()))
            .query(&[("receipt", receipt.as_str())])
            .send()
            .await?;

        let collection: OrderCollection = parse_response(response, "find order").await?;

        Ok(collection
            .items
            .into_iter()
            .find(|order| order.receipt.as_deref() == Some(receipt.as_str())))
    }
}

#[derive(Debug, Deserialize)]
struct OrderCollection {
    items: Vec<ProviderOrder>,
}

async fn parse_response<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> Result<T, PaymentProviderError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        return Err(PaymentProviderError::UnexpectedResponse(format!(
            "{operation} request failed with status {status}: {text}"
        )));
    }

    Ok(response.json().await?)
}
