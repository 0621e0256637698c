use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    middleware::auth::AuthUser,
    routes::auth::{hash_password, verify_password},
    AppState,
};

const DEACTIVATE_CONFIRMATION: &str = "DEACTIVATE";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/password", post(change_password))
        .route("/deactivate", post(deactivate_account))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub confirm_text: String,
}

#[derive(Debug, Serialize)]
pub struct AccountActionResponse {
    pub success: bool,
    pub message: String,
}

async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<AccountActionResponse>> {
    if body.current_password.is_empty()
        || body.new_password.is_empty()
        || body.confirm_password.is_empty()
    {
        return Err(AppError::Validation(
            "All password fields are required".to_string(),
        ));
    }
    if body.new_password != body.confirm_password {
        return Err(AppError::Validation(
            "New password and confirmation don't match".to_string(),
        ));
    }
    if body.new_password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash =
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = ?")
            .bind(&user.id)
            .fetch_optional(&state.db.pool)
            .await?
            .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.current_password, &password_hash)? {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&body.new_password)?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&new_hash)
        .bind(&user.id)
        .execute(&state.db.pool)
        .await?;

    Ok(Json(AccountActionResponse {
        success: true,
        message: "Your password has been updated".to_string(),
    }))
}

async fn deactivate_account(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<DeactivateRequest>,
) -> Result<Json<AccountActionResponse>> {
    // The literal confirmation text is the point; no fuzzy matching
    if body.confirm_text != DEACTIVATE_CONFIRMATION {
        return Err(AppError::Validation(
            "Please type 'DEACTIVATE' to confirm".to_string(),
        ));
    }

    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        "UPDATE user_profiles SET bio = ?, skills = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(format!("[DEACTIVATED] {now}"))
    .bind(r#"["deactivated"]"#)
    .bind(&now)
    .bind(&user.id)
    .execute(&state.db.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Profile not found".to_string()));
    }

    Ok(Json(AccountActionResponse {
        success: true,
        message: "Your account has been deactivated. Contact support to reactivate.".to_string(),
    }))
}
