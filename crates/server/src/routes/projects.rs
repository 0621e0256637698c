use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::models::ProjectStatus,
    error::{AppError, Result},
    middleware::auth::AuthUser,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/:id", get(get_project))
        .route("/:id/assign", post(assign_designer))
        .route("/:id/cancel", post(cancel_project))
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub skills_required: Option<Vec<String>>,
    pub deadline: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignDesignerRequest {
    pub designer_id: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub client_id: String,
    pub designer_id: Option<String>,
    pub client_email: String,
    pub designer_email: Option<String>,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub status: String,
    pub skills_required: Vec<String>,
    pub deadline: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
}

type ProjectRow = (
    String,         // id
    String,         // client_id
    Option<String>, // designer_id
    String,         // client email
    Option<String>, // designer email
    String,         // title
    String,         // description
    f64,            // budget
    String,         // status
    Option<String>, // skills_required
    Option<String>, // deadline
    String,         // created_at
    Option<String>, // completed_at
);

const PROJECT_SELECT: &str = r#"
    SELECT p.id, p.client_id, p.designer_id, c.email, d.email,
           p.title, p.description, p.budget, p.status, p.skills_required,
           p.deadline, p.created_at, p.completed_at
    FROM projects p
    JOIN users c ON p.client_id = c.id
    LEFT JOIN users d ON p.designer_id = d.id
"#;

fn to_response(row: ProjectRow) -> ProjectResponse {
    let (
        id,
        client_id,
        designer_id,
        client_email,
        designer_email,
        title,
        description,
        budget,
        status,
        skills_required,
        deadline,
        created_at,
        completed_at,
    ) = row;

    ProjectResponse {
        id,
        client_id,
        designer_id,
        client_email,
        designer_email,
        title,
        description,
        budget,
        status,
        skills_required: skills_required
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default(),
        deadline,
        created_at,
        completed_at,
    }
}

pub(crate) fn parse_status(raw: &str) -> Result<ProjectStatus> {
    ProjectStatus::parse(raw)
        .ok_or_else(|| AppError::Internal(format!("Unknown project status: {raw}")))
}

async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProjectListResponse>> {
    let sql = format!(
        "{PROJECT_SELECT} WHERE p.client_id = ? OR p.designer_id = ? ORDER BY p.created_at DESC"
    );
    let rows = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(&user.id)
        .bind(&user.id)
        .fetch_all(&state.db.pool)
        .await?;

    Ok(Json(ProjectListResponse {
        projects: rows.into_iter().map(to_response).collect(),
    }))
}

async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>> {
    if body.title.trim().is_empty() {
        return Err(AppError::Validation("Project title is required".to_string()));
    }
    if body.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Project description is required".to_string(),
        ));
    }
    if body.budget < 0.0 {
        return Err(AppError::Validation(
            "Budget must be zero or greater".to_string(),
        ));
    }

    let skills_json = body
        .skills_required
        .as_ref()
        .map(|s| serde_json::to_string(s))
        .transpose()
        .map_err(|_| AppError::Internal("Failed to encode skills".to_string()))?;

    let project_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO projects (id, client_id, title, description, budget, status, skills_required, deadline, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&project_id)
    .bind(&user.id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(body.budget)
    .bind(ProjectStatus::Open.as_str())
    .bind(&skills_json)
    .bind(&body.deadline)
    .bind(&now)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(ProjectResponse {
        id: project_id,
        client_id: user.id,
        designer_id: None,
        client_email: user.email,
        designer_email: None,
        title: body.title,
        description: body.description,
        budget: body.budget,
        status: ProjectStatus::Open.as_str().to_string(),
        skills_required: body.skills_required.unwrap_or_default(),
        deadline: body.deadline,
        created_at: now,
        completed_at: None,
    }))
}

async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>> {
    let sql = format!(
        "{PROJECT_SELECT} WHERE p.id = ? AND (p.client_id = ? OR p.designer_id = ?)"
    );
    let row = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(&id)
        .bind(&user.id)
        .bind(&user.id)
        .fetch_optional(&state.db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Ok(Json(to_response(row)))
}

async fn assign_designer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AssignDesignerRequest>,
) -> Result<Json<ProjectResponse>> {
    let project = sqlx::query_as::<_, (String, String)>(
        "SELECT client_id, status FROM projects WHERE id = ?",
    )
    .bind(&id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let (client_id, status) = project;

    if client_id != user.id {
        return Err(AppError::Forbidden(
            "Only the client can assign a designer".to_string(),
        ));
    }

    let status = parse_status(&status)?;
    if !status.can_transition(ProjectStatus::InProgress) {
        return Err(AppError::Validation(format!(
            "Cannot assign a designer to a {} project",
            status.as_str()
        )));
    }

    // The assignee must be a designer profile
    let designer_type = sqlx::query_scalar::<_, String>(
        "SELECT user_type FROM user_profiles WHERE user_id = ?",
    )
    .bind(&body.designer_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Designer not found".to_string()))?;

    if designer_type != "designer" {
        return Err(AppError::Validation(
            "Selected user is not a designer".to_string(),
        ));
    }

    sqlx::query("UPDATE projects SET designer_id = ?, status = ? WHERE id = ?")
        .bind(&body.designer_id)
        .bind(ProjectStatus::InProgress.as_str())
        .bind(&id)
        .execute(&state.db.pool)
        .await?;

    get_project(State(state), user, Path(id)).await
}

async fn cancel_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>> {
    let project = sqlx::query_as::<_, (String, Option<String>, String)>(
        "SELECT client_id, designer_id, status FROM projects WHERE id = ?",
    )
    .bind(&id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let (client_id, designer_id, status) = project;

    if client_id != user.id && designer_id.as_deref() != Some(user.id.as_str()) {
        return Err(AppError::Forbidden(
            "Only project participants can cancel it".to_string(),
        ));
    }

    let status = parse_status(&status)?;
    if !status.can_transition(ProjectStatus::Cancelled) {
        return Err(AppError::Validation(format!(
            "A {} project cannot be cancelled",
            status.as_str()
        )));
    }

    sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
        .bind(ProjectStatus::Cancelled.as_str())
        .bind(&id)
        .execute(&state.db.pool)
        .await?;

    get_project(State(state), user, Path(id)).await
}
