use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{UserProfile, UserType},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_my_profile).put(update_my_profile))
        .route("/:user_id", get(get_profile))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub portfolio_url: Option<String>,
    pub hourly_rate: Option<f64>,
    pub skills: Option<Vec<String>>,
    pub user_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub user_type: String,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub portfolio_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub user_id: String,
    pub user_type: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub portfolio_url: Option<String>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let skills = profile.skills_vec();
        ProfileResponse {
            user_id: profile.user_id,
            user_type: profile.user_type,
            full_name: profile.full_name,
            email: profile.email,
            bio: profile.bio,
            skills,
            hourly_rate: profile.hourly_rate,
            portfolio_url: profile.portfolio_url,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

async fn fetch_profile(pool: &sqlx::SqlitePool, user_id: &str) -> Result<UserProfile> {
    sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

async fn get_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>> {
    let profile = fetch_profile(&state.db.pool, &user.id).await?;
    Ok(Json(profile.into()))
}

async fn update_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let current = fetch_profile(&state.db.pool, &user.id).await?;

    let full_name = match body.full_name {
        Some(name) => {
            if name.trim().is_empty() {
                return Err(AppError::Validation("Full name is required".to_string()));
            }
            name
        }
        None => current.full_name,
    };

    // The account type is togglable by the user themselves (the Dashboard's
    // "switch to designer" action lands here)
    let user_type = match body.user_type.as_deref() {
        None => current.user_type,
        Some(raw) => UserType::parse(raw)
            .ok_or_else(|| AppError::Validation("Invalid account type".to_string()))?
            .as_str()
            .to_string(),
    };

    let bio = body.bio.or(current.bio);
    let portfolio_url = body.portfolio_url.or(current.portfolio_url);
    let hourly_rate = body.hourly_rate.or(current.hourly_rate);
    let skills_json = match body.skills {
        Some(skills) => Some(
            serde_json::to_string(&skills)
                .map_err(|_| AppError::Internal("Failed to encode skills".to_string()))?,
        ),
        None => current.skills,
    };

    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE user_profiles
        SET user_type = ?, full_name = ?, bio = ?, skills = ?, hourly_rate = ?, portfolio_url = ?, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(&user_type)
    .bind(&full_name)
    .bind(&bio)
    .bind(&skills_json)
    .bind(hourly_rate)
    .bind(&portfolio_url)
    .bind(&now)
    .bind(&user.id)
    .execute(&state.db.pool)
    .await?;

    // Keep the account display name in step with the profile
    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(&full_name)
        .bind(&user.id)
        .execute(&state.db.pool)
        .await?;

    let updated = fetch_profile(&state.db.pool, &user.id).await?;
    Ok(Json(updated.into()))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PublicProfileResponse>> {
    let profile = fetch_profile(&state.db.pool, &user_id).await?;
    let skills = profile.skills_vec();

    Ok(Json(PublicProfileResponse {
        user_id: profile.user_id,
        user_type: profile.user_type,
        full_name: profile.full_name,
        bio: profile.bio,
        skills,
        hourly_rate: profile.hourly_rate,
        portfolio_url: profile.portfolio_url,
    }))
}
