use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{Payment, PaymentStatus};

/// Body for `init/`: payer details and amount in minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct InitPaymentRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub amount: i64,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitPaymentResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub payment: Payment,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

/// Body for `create/`: an offline payment recorded by staff.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub amount: i64,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub user: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<PaymentStatus>,
}
