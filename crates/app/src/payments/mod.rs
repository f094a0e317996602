//! Payment Provider Integration

pub mod provider;
pub mod razorpay;
pub mod signature;

pub use provider::{
    CreateProviderOrder, MockPaymentProvider, PaymentProvider, PaymentProviderError, ProviderOrder,
};
pub use razorpay::{ProviderSecret, RazorpayClient, RazorpayConfig};
pub use signature::SignatureVerifier;
