use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Credentials and endpoint of the payment gateway (Razorpay-compatible API).
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub payment: PaymentConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "membership".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "membership-users".into()),
            ttl_minutes: env_i64("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_i64("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let payment = PaymentConfig {
            key_id: std::env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
            key_secret: std::env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            base_url: std::env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".into()),
            currency: std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".into()),
        };
        if payment.key_secret.is_empty() {
            tracing::warn!("RAZORPAY_KEY_SECRET is empty; payment verification will reject everything");
        }
        Ok(Self {
            database_url,
            jwt,
            payment,
        })
    }
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|v| v.parse::<i64>().ok())
}
