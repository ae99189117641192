use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{
        CreatePaymentRequest, InitPaymentRequest, InitPaymentResponse, PaymentListQuery,
        VerifyPaymentRequest,
    },
    repo_types::{NewPayment, Payment, PaymentStats, PaymentStatus},
    services::{new_receipt, offline_payment, validate_payer, verify_payment},
};
use crate::{
    auth::{
        extractors::{AuthUser, Authorized, CurrentUser},
        permissions::{IsAdminOrIsStaff, Permission},
    },
    error::{AppError, AppResult},
    pagination::Pagination,
    state::AppState,
};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/init/", post(init_payment))
        .route("/verify/", post(verify))
        .route("/stats/", get(stats))
        .route("/list/", get(list_payments))
        .route("/create/", post(create_payment))
        .route("/user-payments/", get(user_payments))
        .route("/:id/", get(payment_detail))
}

/// Creates a gateway order and stores it as `created`.
#[instrument(skip(state, auth, payload))]
pub async fn init_payment(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Json(payload): Json<InitPaymentRequest>,
) -> AppResult<(StatusCode, Json<InitPaymentResponse>)> {
    validate_payer(&payload.name, &payload.email, &payload.phone, payload.amount)?;
    let currency = payload
        .currency
        .clone()
        .unwrap_or_else(|| state.config.payment.currency.clone());

    let order = state
        .gateway
        .create_order(payload.amount, &currency, &new_receipt())
        .await?;

    let payment = Payment::insert(
        &state.db,
        &NewPayment {
            user_ref: auth.map(|AuthUser(id)| id),
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_lowercase(),
            phone: payload.phone.trim().to_string(),
            amount: order.amount,
            currency: order.currency.clone(),
            order_id: order.id.clone(),
            payment_id: None,
            status: PaymentStatus::Created,
        },
    )
    .await?;

    info!(order_id = %order.id, amount = order.amount, "payment order created");
    Ok((
        StatusCode::CREATED,
        Json(InitPaymentResponse {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: state.gateway.key_id().to_string(),
            payment,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> AppResult<Json<Payment>> {
    let payment = verify_payment(&state, &payload).await?;
    Ok(Json(payment))
}

#[instrument(skip_all)]
pub async fn stats(
    State(state): State<AppState>,
    _auth: Authorized<IsAdminOrIsStaff>,
) -> AppResult<Json<PaymentStats>> {
    Ok(Json(Payment::stats(&state.db).await?))
}

#[instrument(skip_all)]
pub async fn list_payments(
    State(state): State<AppState>,
    _auth: Authorized<IsAdminOrIsStaff>,
    Query(filter): Query<PaymentListQuery>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Payment>>> {
    let (limit, offset) = page.normalize();
    let rows = Payment::list(&state.db, filter.status, None, limit, offset).await?;
    Ok(Json(rows))
}

#[instrument(skip_all)]
pub async fn create_payment(
    State(state): State<AppState>,
    Authorized(staff, _): Authorized<IsAdminOrIsStaff>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let new = offline_payment(payload, &state.config.payment.currency)?;
    let payment = Payment::insert(&state.db, &new).await?;
    info!(payment_id = %payment.id, recorded_by = %staff.id, "offline payment recorded");
    Ok((StatusCode::CREATED, Json(payment)))
}

#[instrument(skip_all)]
pub async fn user_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Payment>>> {
    let (limit, offset) = page.normalize();
    let rows = Payment::list(&state.db, None, Some(user.id), limit, offset).await?;
    Ok(Json(rows))
}

/// Visible to admin/staff and to the paying user; others get 404.
#[instrument(skip(state, user))]
pub async fn payment_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let payment = Payment::find_by_id(&state.db, id)
        .await?
        .ok_or_else(AppError::not_found)?;
    if !IsAdminOrIsStaff::has_permission(&user) && payment.user_ref != Some(user.id) {
        return Err(AppError::not_found());
    }
    Ok(Json(payment))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;

    async fn status_of(req: Request<Body>) -> StatusCode {
        payment_routes()
            .with_state(AppState::fake())
            .oneshot(req)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn staff_endpoints_require_token() {
        for path in ["/stats/", "/list/", "/user-payments/"] {
            let req = Request::get(path).body(Body::empty()).unwrap();
            assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED, "{path}");
        }
        let req = Request::post("/create/")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn init_rejects_invalid_payer_before_touching_gateway() {
        let req = Request::post("/init/")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"name":"","email":"x","phone":"1","amount":0}"#,
            ))
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::BAD_REQUEST);
    }
}
