use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const PAYMENT_COLUMNS: &str = "id, user_ref, name, email, phone, amount, currency, \
    order_id, payment_id, signature, status, timestamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Success,
    Failed,
}

/// Payment order record. `amount` is in minor currency units (paise).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_ref: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub amount: i64,
    pub currency: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    #[serde(skip_serializing)]
    pub signature: Option<String>,
    pub status: PaymentStatus,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_ref: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub amount: i64,
    pub currency: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentStats {
    pub total_payments: i64,
    pub created: i64,
    pub success: i64,
    pub failed: i64,
    /// Sum of successful amounts.
    pub total_collected: i64,
}
