use anyhow::Context;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{NewPayment, Payment, PaymentStats, PaymentStatus, PAYMENT_COLUMNS};

impl Payment {
    pub async fn insert(db: &PgPool, new: &NewPayment) -> anyhow::Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (user_ref, name, email, phone, amount, currency, order_id, payment_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(new.user_ref)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(&new.order_id)
        .bind(&new.payment_id)
        .bind(new.status)
        .fetch_one(db)
        .await
        .context("insert payment")?;
        Ok(payment)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find payment by id")?;
        Ok(payment)
    }

    pub async fn find_by_order_id(db: &PgPool, order_id: &str) -> anyhow::Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(db)
        .await
        .context("find payment by order id")?;
        Ok(payment)
    }

    /// Records the gateway outcome for an order. A settled order is never
    /// rewritten; `None` means the row was already `success` (or is gone).
    pub async fn record_outcome(
        db: &PgPool,
        order_id: &str,
        payment_id: &str,
        signature: &str,
        status: PaymentStatus,
    ) -> anyhow::Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
               SET payment_id = $2, signature = $3, status = $4
             WHERE order_id = $1 AND status <> 'success'
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(payment_id)
        .bind(signature)
        .bind(status)
        .fetch_optional(db)
        .await
        .context("record payment outcome")?;
        Ok(payment)
    }

    pub async fn list(
        db: &PgPool,
        status: Option<PaymentStatus>,
        user_ref: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Payment>> {
        let mut qb = list_query(status, user_ref, limit, offset);
        let rows = qb
            .build_query_as::<Payment>()
            .fetch_all(db)
            .await
            .context("list payments")?;
        Ok(rows)
    }

    pub async fn stats(db: &PgPool) -> anyhow::Result<PaymentStats> {
        let stats = sqlx::query_as::<_, PaymentStats>(
            r#"
            SELECT COUNT(*)                                      AS total_payments,
                   COUNT(*) FILTER (WHERE status = 'created')    AS created,
                   COUNT(*) FILTER (WHERE status = 'success')    AS success,
                   COUNT(*) FILTER (WHERE status = 'failed')     AS failed,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'success'), 0)::BIGINT
                                                                 AS total_collected
              FROM payments
            "#,
        )
        .fetch_one(db)
        .await
        .context("payment stats")?;
        Ok(stats)
    }
}

fn list_query(
    status: Option<PaymentStatus>,
    user_ref: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE TRUE"));
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(user) = user_ref {
        qb.push(" AND user_ref = ").push_bind(user);
    }
    qb.push(" ORDER BY timestamp DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb
}
