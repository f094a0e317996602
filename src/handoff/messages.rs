//! Handoff Messages

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handoff::HandoffError;

/// Proof of payment returned by the provider's checkout surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    /// Provider order the payment was made against.
    pub provider_order_id: String,
    /// Provider identifier of the captured payment.
    pub provider_payment_id: String,
    /// Hex HMAC-SHA256 of `"{provider_order_id}|{provider_payment_id}"`.
    pub provider_signature: String,
}

/// A result posted back by the payment surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum HandoffMessage {
    /// The user paid.
    PaymentSuccess {
        /// Attempt the surface was opened for.
        attempt_id: Uuid,
        /// Confirmation to forward for server-side verification.
        data: PaymentConfirmation,
    },

    /// The user dismissed the surface.
    PaymentCancelled {
        /// Attempt the surface was opened for.
        attempt_id: Uuid,
    },
}

impl HandoffMessage {
    /// Parse and shape-check a raw message.
    ///
    /// # Errors
    ///
    /// [`HandoffError::MalformedMessage`] when the payload is not a known message or a
    /// confirmation field is empty.
    pub fn parse(raw: &str) -> Result<Self, HandoffError> {
        let message: Self = serde_json::from_str(raw)
            .map_err(|error| HandoffError::MalformedMessage(error.to_string()))?;

        if let Self::PaymentSuccess { data, .. } = &message {
            let fields = [
                ("providerOrderId", &data.provider_order_id),
                ("providerPaymentId", &data.provider_payment_id),
                ("providerSignature", &data.provider_signature),
            ];

            if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
                return Err(HandoffError::MalformedMessage(format!("{name} is empty")));
            }
        }

        Ok(message)
    }

    /// The attempt this message belongs to.
    #[must_use]
    pub fn attempt_id(&self) -> Uuid {
        match self {
            Self::PaymentSuccess { attempt_id, .. } | Self::PaymentCancelled { attempt_id } => {
                *attempt_id
            }
        }
    }
}
