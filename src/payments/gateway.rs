use anyhow::Context;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

use crate::config::PaymentConfig;

/// Order as reported by the payment gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder>;

    /// Checks the checkout signature returned to the client.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;

    /// Public key id handed to the checkout widget.
    fn key_id(&self) -> &str;
}

/// HMAC-SHA256 over `order_id|payment_id`, hex encoded.
#[cfg(test)]
pub fn payment_signature(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&expected).is_ok()
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay orders API client.
#[derive(Clone)]
pub struct Razorpay {
    http: reqwest::Client,
    config: PaymentConfig,
}

impl Razorpay {
    pub fn new(config: PaymentConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("build http client")?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl PaymentGateway for Razorpay {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder> {
        let url = format!("{}/v1/orders", self.config.base_url.trim_end_matches('/'));
        let order = self
            .http
            .post(&url)
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderBody {
                amount,
                currency,
                receipt,
            })
            .send()
            .await
            .context("gateway create order")?
            .error_for_status()
            .context("gateway rejected order")?
            .json::<GatewayOrder>()
            .await
            .context("decode gateway order")?;
        debug!(order_id = %order.id, amount = order.amount, "gateway order created");
        Ok(order)
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(&self.config.key_secret, order_id, payment_id, signature)
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }
}
