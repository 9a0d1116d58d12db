pub mod razorpay;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// A pending order registered with the gateway. Amounts are in minor units
/// (paise for INR) because that is what the gateway speaks.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub gateway_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder>;

    /// Browser checkout callback: signature over "order_id|payment_id".
    fn verify_checkout_signature(
        &self,
        gateway_order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> bool;

    /// Server-to-server webhook: signature over the raw request body.
    fn verify_webhook_signature(&self, body: &[u8], signature: &str) -> bool;
}

/// Decimal major units to integer minor units. Amounts are already rounded
/// to two decimal places by the pricing step, so the conversion is exact.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    let minor = amount * Decimal::from(100);
    if minor.fract() != Decimal::ZERO {
        anyhow::bail!("Amount {} has sub-minor-unit precision", amount);
    }
    minor
        .to_i64()
        .ok_or_else(|| anyhow::anyhow!("Amount {} out of range for gateway", amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn minor_units_conversion() {
        assert_eq!(to_minor_units(d("499.00")).unwrap(), 49900);
        assert_eq!(to_minor_units(d("0.01")).unwrap(), 1);
        assert_eq!(to_minor_units(d("11798.82")).unwrap(), 1179882);
    }

    #[test]
    fn minor_units_rejects_fractional_paise() {
        assert!(to_minor_units(d("10.005")).is_err());
    }
}
