use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::models::PaymentType,
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::stripe,
    AppState,
};

/// Platform commission, fixed at 10% across the system.
pub const COMMISSION_RATE: f64 = 10.0;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment))
        .route("/config", get(payment_config))
        .route("/project/:project_id", get(list_project_payments))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub project_id: Option<String>,
    pub amount: Option<f64>,
    pub payment_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub client_secret: String,
    pub payment_id: String,
    pub commission_amount: f64,
    pub designer_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfigResponse {
    pub publishable_key: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub project_id: String,
    pub amount: f64,
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub designer_amount: f64,
    pub payment_type: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Splits an amount into (commission, designer payout). The two parts always
/// sum back to the original amount.
pub fn commission_split(amount: f64) -> (f64, f64) {
    let commission = round2(amount * COMMISSION_RATE / 100.0);
    (commission, amount - commission)
}

async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreatePaymentRequest>,
) -> Result<Json<CreatePaymentResponse>> {
    let (project_id, amount) = match (body.project_id, body.amount) {
        (Some(p), Some(a)) if !p.is_empty() => (p, a),
        _ => return Err(AppError::Validation("Missing required fields".to_string())),
    };

    if amount <= 0.0 || !amount.is_finite() {
        return Err(AppError::Validation(
            "Amount must be a positive number".to_string(),
        ));
    }

    let payment_type = match body.payment_type.as_deref() {
        None => PaymentType::Deposit,
        Some(raw) => PaymentType::parse(raw)
            .ok_or_else(|| AppError::Validation(format!("Invalid payment type: {raw}")))?,
    };

    // Load the project and its participants
    let project = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT client_id, designer_id FROM projects WHERE id = ?",
    )
    .bind(&project_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let (client_id, designer_id) = project;

    if client_id != user.id {
        return Err(AppError::Forbidden(
            "Only the client can pay for this project".to_string(),
        ));
    }

    let (commission_amount, designer_amount) = commission_split(amount);

    let intent = stripe::create_payment_intent(
        &state.http,
        &state.config,
        amount,
        &project_id,
        payment_type,
        COMMISSION_RATE,
    )
    .await?;

    let payment_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO payments
            (id, project_id, client_id, designer_id, amount, commission_rate,
             commission_amount, designer_amount, stripe_payment_intent_id,
             payment_type, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(&payment_id)
    .bind(&project_id)
    .bind(&client_id)
    .bind(&designer_id)
    .bind(amount)
    .bind(COMMISSION_RATE)
    .bind(commission_amount)
    .bind(designer_amount)
    .bind(&intent.id)
    .bind(payment_type.as_str())
    .bind(&now)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(CreatePaymentResponse {
        client_secret: intent.client_secret,
        payment_id,
        commission_amount,
        designer_amount,
    }))
}

async fn payment_config(State(state): State<AppState>) -> Result<Json<PaymentConfigResponse>> {
    let publishable_key = state
        .config
        .stripe_publishable_key
        .clone()
        .ok_or_else(|| AppError::Payment("Stripe configuration missing".to_string()))?;

    Ok(Json(PaymentConfigResponse { publishable_key }))
}

async fn list_project_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<PaymentListResponse>> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM projects WHERE id = ? AND (client_id = ? OR designer_id = ?)",
    )
    .bind(&project_id)
    .bind(&user.id)
    .bind(&user.id)
    .fetch_one(&state.db.pool)
    .await?;

    if exists == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    let rows = sqlx::query_as::<_, (String, String, f64, f64, f64, f64, String, String, String)>(
        r#"
        SELECT id, project_id, amount, commission_rate, commission_amount,
               designer_amount, payment_type, status, created_at
        FROM payments
        WHERE project_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(&project_id)
    .fetch_all(&state.db.pool)
    .await?;

    let payments = rows
        .into_iter()
        .map(
            |(
                id,
                project_id,
                amount,
                commission_rate,
                commission_amount,
                designer_amount,
                payment_type,
                status,
                created_at,
            )| PaymentResponse {
                id,
                project_id,
                amount,
                commission_rate,
                commission_amount,
                designer_amount,
                payment_type,
                status,
                created_at,
            },
        )
        .collect();

    Ok(Json(PaymentListResponse { payments }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_hundred_splits_into_twenty_and_one_eighty() {
        let (commission, designer) = commission_split(200.0);
        assert_eq!(commission, 20.0);
        assert_eq!(designer, 180.0);
    }

    #[test]
    fn split_parts_always_sum_back_to_the_amount() {
        for amount in [0.0, 0.01, 1.0, 49.99, 100.0, 333.33, 1234.56, 99999.99] {
            let (commission, designer) = commission_split(amount);
            assert!(
                (commission + designer - amount).abs() < 1e-9,
                "amount {amount} split into {commission} + {designer}"
            );
            assert!(commission >= 0.0);
            assert!(designer >= 0.0);
        }
    }

    #[test]
    fn commission_is_ten_percent_rounded_to_cents() {
        let (commission, _) = commission_split(0.04);
        assert_eq!(commission, 0.0);

        let (commission, _) = commission_split(0.05);
        assert_eq!(commission, 0.01);

        let (commission, _) = commission_split(333.33);
        assert_eq!(commission, 33.33);
    }

    #[test]
    fn zero_amount_splits_into_zeroes() {
        assert_eq!(commission_split(0.0), (0.0, 0.0));
    }
}
