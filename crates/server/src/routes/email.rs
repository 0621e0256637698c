use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    services::email::{self, EmailKind},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(send_email))
        .route("/test", post(send_test_email))
}

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub email: Option<String>,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub email: Option<String>,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message_id: String,
    pub message: String,
}

async fn send_email(
    State(state): State<AppState>,
    Json(body): Json<SendEmailRequest>,
) -> Result<Json<SendEmailResponse>> {
    let email = body
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    let kind_raw = body.kind.as_deref().unwrap_or("verification");
    let kind = EmailKind::parse(kind_raw)
        .ok_or_else(|| AppError::Validation(format!("Unsupported email type: {kind_raw}")))?;

    let message_id = email::send_branded(
        &state.http,
        &state.config,
        email,
        body.full_name.as_deref(),
        kind,
    )
    .await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message_id,
        message: "Branded verification email sent successfully".to_string(),
    }))
}

async fn send_test_email(
    State(state): State<AppState>,
    Json(body): Json<TestEmailRequest>,
) -> Result<Json<SendEmailResponse>> {
    let email = body.email.as_deref().unwrap_or("test@example.com");
    let full_name = body.full_name.as_deref().unwrap_or("Test User");

    let message_id = email::send_branded(
        &state.http,
        &state.config,
        email,
        Some(full_name),
        EmailKind::Test,
    )
    .await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message_id,
        message: "Test email sent successfully".to_string(),
    }))
}
