//! Payments Config

use clap::Args;
use rebound_app::payments::{ProviderSecret, RazorpayConfig};

/// Payment provider credentials.
#[derive(Debug, Args)]
pub struct PaymentsConfig {
    /// Provider API base URL
    #[arg(long, env = "RAZORPAY_BASE_URL", default_value = "https://api.razorpay.com")]
    pub razorpay_base_url: String,

    /// Provider public key id
    #[arg(long, env = "RAZORPAY_KEY_ID")]
    pub razorpay_key_id: String,

    /// Provider API secret, also used to verify payment signatures
    #[arg(long, env = "RAZORPAY_KEY_SECRET", hide_env_values = true)]
    pub razorpay_key_secret: String,
}

impl PaymentsConfig {
    /// Consume the settings into a client configuration.
    #[must_use]
    pub fn into_razorpay_config(self) -> RazorpayConfig {
        RazorpayConfig {
            base_url: self.razorpay_base_url,
            key_id: self.razorpay_key_id,
            key_secret: ProviderSecret::new(self.razorpay_key_secret),
        }
    }
}
