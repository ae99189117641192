use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::VerifyPaymentRequest,
    repo_types::{NewPayment, Payment, PaymentStatus},
};
use crate::{
    accounts::services::{is_valid_email, is_valid_phone},
    error::{AppError, AppResult, FieldErrors},
    state::AppState,
};

/// Shape checks shared by `init/` and `create/`.
pub fn validate_payer(name: &str, email: &str, phone: &str, amount: i64) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if name.trim().is_empty() {
        errors.entry("name".into()).or_default().push("This field may not be blank.".into());
    }
    if !is_valid_email(email.trim()) {
        errors.entry("email".into()).or_default().push("Enter a valid email address.".into());
    }
    if !is_valid_phone(phone.trim()) {
        errors.entry("phone".into()).or_default().push("Enter a valid phone number.".into());
    }
    if amount <= 0 {
        errors
            .entry("amount".into())
            .or_default()
            .push("Ensure this value is greater than 0.".into());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn new_receipt() -> String {
    format!("rcpt_{}", Uuid::new_v4().simple())
}

/// What a verification attempt should do with the stored order.
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Already settled with this payment id; nothing to write.
    AlreadySettled,
    /// Settled with a different payment id.
    Conflict,
    Record(PaymentStatus),
}

pub fn decide_outcome(current: &Payment, payment_id: &str, signature_ok: bool) -> VerifyOutcome {
    if current.status == PaymentStatus::Success {
        return if current.payment_id.as_deref() == Some(payment_id) {
            VerifyOutcome::AlreadySettled
        } else {
            VerifyOutcome::Conflict
        };
    }
    if signature_ok {
        VerifyOutcome::Record(PaymentStatus::Success)
    } else {
        VerifyOutcome::Record(PaymentStatus::Failed)
    }
}

pub async fn verify_payment(state: &AppState, req: &VerifyPaymentRequest) -> AppResult<Payment> {
    let current = Payment::find_by_order_id(&state.db, &req.order_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    let signature_ok = state
        .gateway
        .verify_signature(&req.order_id, &req.payment_id, &req.signature);

    let status = match decide_outcome(&current, &req.payment_id, signature_ok) {
        VerifyOutcome::Record(status) => status,
        settled => return settled_response(current, settled, &req.order_id),
    };

    let Some(payment) = Payment::record_outcome(
        &state.db,
        &req.order_id,
        &req.payment_id,
        &req.signature,
        status,
    )
    .await?
    else {
        // another verify settled the order between the read and the write
        let settled = Payment::find_by_order_id(&state.db, &req.order_id)
            .await?
            .ok_or_else(AppError::not_found)?;
        let outcome = decide_outcome(&settled, &req.payment_id, signature_ok);
        return settled_response(settled, outcome, &req.order_id);
    };

    if status == PaymentStatus::Success {
        info!(order_id = %payment.order_id, payment_id = %req.payment_id, "payment verified");
        Ok(payment)
    } else {
        warn!(order_id = %payment.order_id, "payment signature mismatch");
        Err(AppError::BadRequest("Payment verification failed.".into()))
    }
}

fn settled_response(current: Payment, outcome: VerifyOutcome, order_id: &str) -> AppResult<Payment> {
    match outcome {
        VerifyOutcome::AlreadySettled => Ok(current),
        VerifyOutcome::Conflict => {
            warn!(order_id, "order already settled with another payment");
            Err(AppError::BadRequest("Order already paid.".into()))
        }
        VerifyOutcome::Record(_) => Err(AppError::Internal(anyhow::anyhow!(
            "order {order_id} was not settled after a rejected write"
        ))),
    }
}

pub fn offline_payment(
    req: super::dto::CreatePaymentRequest,
    default_currency: &str,
) -> AppResult<NewPayment> {
    validate_payer(&req.name, &req.email, &req.phone, req.amount)?;
    Ok(NewPayment {
        user_ref: req.user,
        name: req.name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        phone: req.phone.trim().to_string(),
        amount: req.amount,
        currency: req.currency.unwrap_or_else(|| default_currency.to_string()),
        order_id: req
            .order_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("offline_{}", Uuid::new_v4().simple())),
        payment_id: req.payment_id,
        status: req.status.unwrap_or(PaymentStatus::Success),
    })
}
