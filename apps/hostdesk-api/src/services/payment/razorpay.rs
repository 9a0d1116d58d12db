use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{GatewayOrder, PaymentGateway};
use crate::settings::SettingsService;

type HmacSha256 = Hmac<Sha256>;

const API_BASE: &str = "https://api.razorpay.com/v1";

pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    webhook_secret: String,
    api_base: String,
    client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String, webhook_secret: String) -> Self {
        Self {
            key_id,
            key_secret,
            webhook_secret,
            api_base: API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Credentials come from the settings cache at call time; admins can
    /// rotate keys through the settings endpoint without a restart.
    pub async fn from_settings(settings: &SettingsService) -> Self {
        Self::new(
            settings.get_or_default("razorpay_key_id", "").await,
            settings.get_or_default("razorpay_key_secret", "").await,
            settings.get_or_default("razorpay_webhook_secret", "").await,
        )
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.to_string();
        self
    }

    fn hmac_hex(secret: &str, message: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of a hex-encoded HMAC-SHA256 signature.
    fn verify_hmac(secret: &str, message: &[u8], signature: &str) -> bool {
        // An unconfigured secret never verifies: anyone can compute an
        // empty-key digest.
        if secret.is_empty() {
            return false;
        }
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
        mac.update(message);
        mac.verify_slice(&expected).is_ok()
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder> {
        let body = serde_json::json!({
            "amount": amount_minor,
            "currency": currency,
            "receipt": receipt,
        });

        let resp = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .context("Gateway order request failed")?;

        let status = resp.status();
        let payload: serde_json::Value = resp
            .json()
            .await
            .context("Gateway order response was not JSON")?;

        if !status.is_success() {
            anyhow::bail!("Gateway rejected order creation ({}): {}", status, payload);
        }

        let gateway_order_id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Gateway order response missing id"))?
            .to_string();

        Ok(GatewayOrder {
            gateway_order_id,
            amount_minor,
            currency: currency.to_string(),
        })
    }

    fn verify_checkout_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool {
        let message = format!("{}|{}", gateway_order_id, payment_id);
        Self::verify_hmac(&self.key_secret, message.as_bytes(), signature)
    }

    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool {
        Self::verify_hmac(&self.webhook_secret, body, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> RazorpayGateway {
        RazorpayGateway::new(
            "rzp_test_key".into(),
            "checkout_secret".into(),
            "webhook_secret".into(),
        )
    }

    #[test]
    fn checkout_signature_accepts_matching_hmac() {
        let gw = gateway();
        let expected =
            RazorpayGateway::hmac_hex("checkout_secret", b"order_ABC123|pay_XYZ789");
        assert!(gw.verify_checkout_signature("order_ABC123", "pay_XYZ789", &expected));
        // Gateways sometimes send uppercase hex.
        assert!(gw.verify_checkout_signature(
            "order_ABC123",
            "pay_XYZ789",
            &expected.to_uppercase()
        ));
    }

    #[test]
    fn checkout_signature_rejects_tampered_ids() {
        let gw = gateway();
        let signature =
            RazorpayGateway::hmac_hex("checkout_secret", b"order_ABC123|pay_XYZ789");
        assert!(!gw.verify_checkout_signature("order_ABC124", "pay_XYZ789", &signature));
        assert!(!gw.verify_checkout_signature("order_ABC123", "pay_XYZ790", &signature));
    }

    #[test]
    fn webhook_signature_uses_webhook_secret_not_key_secret() {
        let gw = gateway();
        let body = br#"{"event":"payment.captured"}"#;
        let good = RazorpayGateway::hmac_hex("webhook_secret", body);
        let wrong = RazorpayGateway::hmac_hex("checkout_secret", body);
        assert!(gw.verify_webhook_signature(body, &good));
        assert!(!gw.verify_webhook_signature(body, &wrong));
    }

    #[test]
    fn malformed_signature_is_rejected() {
        let gw = gateway();
        assert!(!gw.verify_checkout_signature("order_ABC123", "pay_XYZ789", "not-hex"));
        assert!(!gw.verify_webhook_signature(b"{}", ""));
    }

    #[test]
    fn unconfigured_secret_rejects_all_signatures() {
        let gw = RazorpayGateway::new("".into(), "".into(), "".into());
        let body = br#"{"event":"payment.captured"}"#;
        assert!(!gw.verify_webhook_signature(body, &RazorpayGateway::hmac_hex("", body)));
        assert!(!gw.verify_checkout_signature(
            "order_ABC123",
            "pay_XYZ789",
            &RazorpayGateway::hmac_hex("", b"order_ABC123|pay_XYZ789")
        ));
    }

    #[test]
    fn rotated_webhook_secret_takes_effect_on_rebuild() {
        let body = br#"{"event":"payment.captured"}"#;
        let signature = RazorpayGateway::hmac_hex("rotated_secret", body);
        assert!(!gateway().verify_webhook_signature(body, &signature));

        let rebuilt = RazorpayGateway::new(
            "rzp_test_key".into(),
            "checkout_secret".into(),
            "rotated_secret".into(),
        );
        assert!(rebuilt.verify_webhook_signature(body, &signature));
    }

    #[test]
    fn hmac_hex_matches_known_vector() {
        // HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let out = RazorpayGateway::hmac_hex("key", b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            out,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[tokio::test]
    async fn create_order_fails_cleanly_when_unreachable() {
        let gw = gateway().with_api_base("http://127.0.0.1:1/v1");
        let err = gw.create_order(49900, "INR", "order_1").await.unwrap_err();
        assert!(err.to_string().contains("Gateway order request failed"));
    }
}
