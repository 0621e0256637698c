use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::models::{Deliverable, ProjectStatus},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    routes::projects::parse_status,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_deliverable))
        .route("/project/:project_id", get(list_deliverables))
        .route("/:id/review", post(review_deliverable))
}

#[derive(Debug, Deserialize)]
pub struct SubmitDeliverableRequest {
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_url: String,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReviewDeliverableRequest {
    pub approved: bool,
    pub revision_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeliverableResponse {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_url: String,
    pub is_final_deliverable: bool,
    pub is_watermarked: bool,
    pub client_approved: bool,
    pub approved_at: Option<String>,
    pub revision_notes: Option<String>,
    pub uploaded_at: String,
}

#[derive(Debug, Serialize)]
pub struct DeliverableListResponse {
    pub deliverables: Vec<DeliverableResponse>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub deliverable: DeliverableResponse,
    pub project_status: String,
    pub project_completed: bool,
}

impl From<Deliverable> for DeliverableResponse {
    fn from(d: Deliverable) -> Self {
        DeliverableResponse {
            id: d.id,
            project_id: d.project_id,
            title: d.title,
            description: d.description,
            file_name: d.file_name,
            file_url: d.file_url,
            is_final_deliverable: d.is_final_deliverable,
            is_watermarked: d.is_watermarked,
            client_approved: d.client_approved,
            approved_at: d.approved_at,
            revision_notes: d.revision_notes,
            uploaded_at: d.uploaded_at,
        }
    }
}

// Helper to check if user is a participant of the project
async fn check_project_access(
    pool: &sqlx::SqlitePool,
    project_id: &str,
    user_id: &str,
) -> Result<()> {
    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM projects WHERE id = ? AND (client_id = ? OR designer_id = ?)",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if exists == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }
    Ok(())
}

async fn fetch_deliverable(pool: &sqlx::SqlitePool, id: &str) -> Result<Deliverable> {
    sqlx::query_as::<_, Deliverable>("SELECT * FROM project_deliverables WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Deliverable not found".to_string()))
}

async fn list_deliverables(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<DeliverableListResponse>> {
    check_project_access(&state.db.pool, &project_id, &user.id).await?;

    let deliverables = sqlx::query_as::<_, Deliverable>(
        "SELECT * FROM project_deliverables WHERE project_id = ? ORDER BY uploaded_at DESC",
    )
    .bind(&project_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(Json(DeliverableListResponse {
        deliverables: deliverables.into_iter().map(Into::into).collect(),
    }))
}

async fn submit_deliverable(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<SubmitDeliverableRequest>,
) -> Result<Json<DeliverableResponse>> {
    if body.title.trim().is_empty() || body.file_name.trim().is_empty() || body.file_url.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Title, file name and file URL are required".to_string(),
        ));
    }

    let project = sqlx::query_as::<_, (Option<String>, String)>(
        "SELECT designer_id, status FROM projects WHERE id = ?",
    )
    .bind(&body.project_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let (designer_id, status) = project;

    if designer_id.as_deref() != Some(user.id.as_str()) {
        return Err(AppError::Forbidden(
            "Only the project's designer can submit deliverables".to_string(),
        ));
    }

    let status = parse_status(&status)?;
    if !status.can_transition(ProjectStatus::PendingApproval) {
        return Err(AppError::Validation(format!(
            "Deliverables cannot be submitted while the project is {}",
            status.as_str()
        )));
    }

    let deliverable_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    // New deliverables are watermarked until approval
    sqlx::query(
        r#"
        INSERT INTO project_deliverables
            (id, project_id, title, description, file_name, file_url,
             is_final_deliverable, is_watermarked, client_approved, uploaded_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, 0, ?)
        "#,
    )
    .bind(&deliverable_id)
    .bind(&body.project_id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.file_name)
    .bind(&body.file_url)
    .bind(body.is_final)
    .bind(&now)
    .execute(&state.db.pool)
    .await?;

    sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
        .bind(ProjectStatus::PendingApproval.as_str())
        .bind(&body.project_id)
        .execute(&state.db.pool)
        .await?;

    let deliverable = fetch_deliverable(&state.db.pool, &deliverable_id).await?;
    Ok(Json(deliverable.into()))
}

async fn review_deliverable(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ReviewDeliverableRequest>,
) -> Result<Json<ReviewResponse>> {
    let deliverable = fetch_deliverable(&state.db.pool, &id).await?;

    let project = sqlx::query_as::<_, (String, String)>(
        "SELECT client_id, status FROM projects WHERE id = ?",
    )
    .bind(&deliverable.project_id)
    .fetch_optional(&state.db.pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    let (client_id, status) = project;

    if client_id != user.id {
        return Err(AppError::Forbidden(
            "Only the client can review deliverables".to_string(),
        ));
    }

    let status = parse_status(&status)?;
    let next_status = if !body.approved {
        ProjectStatus::RevisionRequested
    } else if deliverable.is_final_deliverable {
        ProjectStatus::Completed
    } else {
        ProjectStatus::InProgress
    };

    if !status.can_transition(next_status) {
        return Err(AppError::Validation(
            "Project is not awaiting approval".to_string(),
        ));
    }

    let now = Utc::now().to_rfc3339();

    if body.approved {
        // Approval clears the watermark on this deliverable
        sqlx::query(
            r#"
            UPDATE project_deliverables
            SET client_approved = 1, approved_at = ?, is_watermarked = 0, revision_notes = NULL
            WHERE id = ?
            "#,
        )
        .bind(&now)
        .bind(&id)
        .execute(&state.db.pool)
        .await?;

        if next_status == ProjectStatus::Completed {
            // Completing the project clears every remaining watermark
            sqlx::query("UPDATE project_deliverables SET is_watermarked = 0 WHERE project_id = ?")
                .bind(&deliverable.project_id)
                .execute(&state.db.pool)
                .await?;

            sqlx::query("UPDATE projects SET status = ?, completed_at = ? WHERE id = ?")
                .bind(next_status.as_str())
                .bind(&now)
                .bind(&deliverable.project_id)
                .execute(&state.db.pool)
                .await?;
        } else {
            sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
                .bind(next_status.as_str())
                .bind(&deliverable.project_id)
                .execute(&state.db.pool)
                .await?;
        }
    } else {
        let notes = body
            .revision_notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                AppError::Validation(
                    "Revision notes are required when requesting changes".to_string(),
                )
            })?;

        sqlx::query(
            "UPDATE project_deliverables SET client_approved = 0, revision_notes = ? WHERE id = ?",
        )
        .bind(notes)
        .bind(&id)
        .execute(&state.db.pool)
        .await?;

        sqlx::query("UPDATE projects SET status = ? WHERE id = ?")
            .bind(next_status.as_str())
            .bind(&deliverable.project_id)
            .execute(&state.db.pool)
            .await?;
    }

    let updated = fetch_deliverable(&state.db.pool, &id).await?;

    Ok(Json(ReviewResponse {
        deliverable: updated.into(),
        project_status: next_status.as_str().to_string(),
        project_completed: next_status == ProjectStatus::Completed,
    }))
}
