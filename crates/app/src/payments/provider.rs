//! Payment provider abstraction.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A provider order as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderOrder {
    /// Provider-assigned order identifier.
    pub id: String,

    /// Amount in minor units.
    pub amount: i64,

    /// ISO currency code.
    pub currency: String,

    /// Merchant reference the order was created with.
    #[serde(default)]
    pub receipt: Option<String>,

    /// Provider order status, e.g. `created` or `paid`.
    pub status: String,
}

/// Parameters for creating a provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateProviderOrder {
    /// Amount in minor units.
    pub amount: i64,

    /// ISO currency code.
    pub currency: String,

    /// Deterministic merchant reference used to find the order again.
    pub receipt: String,
}

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentProviderError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-2xx response or an unexpected body.
    #[error("unexpected response from payment provider: {0}")]
    UnexpectedResponse(String),
}

#[automock]
#[async_trait]
/// Order operations offered by the payment provider.
pub trait PaymentProvider: Send + Sync {
    /// Public key identifier handed to the checkout surface.
    fn key_id(&self) -> String;

    /// Create an order for the given amount.
    async fn create_order(
        &self,
        order: CreateProviderOrder,
    ) -> Result<ProviderOrder, PaymentProviderError>;

    /// Find an order previously created with `receipt`.
    async fn find_order_by_receipt(
        &self,
        receipt: String,
    ) -> Result<Option<ProviderOrder>, PaymentProviderError>;
}
