//! Payment signature verification.

use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the HMAC-SHA256 signature the provider attaches to a successful payment.
///
/// The signed message is `"{provider_order_id}|{provider_payment_id}"` and the signature
/// is its lowercase hex digest keyed with the provider secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    mac: HmacSha256,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SignatureVerifier(**redacted**)")
    }
}

impl SignatureVerifier {
    /// Key a verifier with the provider secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is rejected by the MAC.
    pub fn new(secret: &[u8]) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    /// Produce the hex signature for an order and payment.
    #[must_use]
    pub fn sign(&self, provider_order_id: &str, provider_payment_id: &str) -> String {
        let mac = self.message(provider_order_id, provider_payment_id);

        hex::encode(mac.finalize().into_bytes())
    }

    /// Check a hex signature in constant time.
    #[must_use]
    pub fn verify(&self, provider_order_id: &str, provider_payment_id: &str, signature: &str) -> bool {
        let Ok(signature) = hex::decode(signature.trim()) else {
            return false;
        };

        self.message(provider_order_id, provider_payment_id)
            .verify_slice(&signature)
            .is_ok()
    }

    fn message(&self, provider_order_id: &str, provider_payment_id: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();

        mac.update(provider_order_id.as_bytes());
        mac.update(b"|");
        mac.update(provider_payment_id.as_bytes());

        mac
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn signs_order_and_payment_ids() -> TestResult {
        let verifier = SignatureVerifier::new(b"secret")?;

        let mut mac = HmacSha256::new_from_slice(b"secret")?;

        mac.update(b"order_1|pay_1");

        assert_eq!(
            verifier.sign("order_1", "pay_1"),
            hex::encode(mac.finalize().into_bytes())
        );

        Ok(())
    }

    #[test]
    fn verifies_matching_signature() -> TestResult {
        let verifier = SignatureVerifier::new(b"secret")?;
        let signature = verifier.sign("order_1", "pay_1");

        assert!(verifier.verify("order_1", "pay_1", &signature));

        Ok(())
    }

    #[test]
    fn rejects_mismatching_signatures() -> TestResult {
        let verifier = SignatureVerifier::new(b"secret")?;
        let other = SignatureVerifier::new(b"other")?;
        let signature = verifier.sign("order_1", "pay_1");

        assert!(!verifier.verify("order_1", "pay_2", &signature));
        assert!(!verifier.verify("order_2", "pay_1", &signature));
        assert!(!other.verify("order_1", "pay_1", &signature));
        assert!(!verifier.verify("order_1", "pay_1", "not-hex"));
        assert!(!verifier.verify("order_1", "pay_1", ""));

        Ok(())
    }

    #[test]
    fn separator_prevents_ambiguous_messages() -> TestResult {
        let verifier = SignatureVerifier::new(b"secret")?;
        let signature = verifier.sign("order_1", "pay_1");

        assert!(!verifier.verify("order_1|pay", "_1", &signature));

        Ok(())
    }
}
