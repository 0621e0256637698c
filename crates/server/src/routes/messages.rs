use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::models::{Message, ProjectStatus},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    routes::projects::parse_status,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(send_message))
        .route("/project/:project_id", get(list_messages))
        .route("/upload", post(upload_attachment))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub project_id: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub project_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub kind: String,
    pub image_url: Option<String>,
    pub file_name: Option<String>,
    pub watermarked: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    pub project_completed: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadAttachmentResponse {
    pub url: String,
    pub file_name: String,
}

/// Image attachments stay visually watermarked until the owning project is
/// completed; completion wins over the stored flag.
pub fn watermark_visible(is_watermarked: bool, project_completed: bool) -> bool {
    is_watermarked && !project_completed
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

async fn project_completed(pool: &sqlx::SqlitePool, project_id: &str) -> Result<bool> {
    let status = sqlx::query_scalar::<_, String>("SELECT status FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Ok(parse_status(&status)? == ProjectStatus::Completed)
}

fn to_response(message: Message, sender_name: String, completed: bool) -> MessageResponse {
    MessageResponse {
        watermarked: watermark_visible(message.is_watermarked, completed),
        id: message.id,
        project_id: message.project_id,
        sender_id: message.sender_id,
        sender_name,
        content: message.content,
        kind: message.kind,
        image_url: message.image_url,
        file_name: message.file_name,
        created_at: message.created_at,
    }
}

async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<MessageListResponse>> {
    check_project_access(&state.db.pool, &project_id, &user.id).await?;
    let completed = project_completed(&state.db.pool, &project_id).await?;

    let rows = sqlx::query_as::<_, (String, String, String, String, String, String, Option<String>, Option<String>, bool, String)>(
        r#"
        SELECT m.id, m.project_id, m.sender_id, u.name, m.content, m.kind,
               m.image_url, m.file_name, m.is_watermarked, m.created_at
        FROM messages m
        JOIN users u ON m.sender_id = u.id
        WHERE m.project_id = ?
        ORDER BY m.created_at ASC
        "#,
    )
    .bind(&project_id)
    .fetch_all(&state.db.pool)
    .await?;

    let messages = rows
        .into_iter()
        .map(
            |(
                id,
                project_id,
                sender_id,
                sender_name,
                content,
                kind,
                image_url,
                file_name,
                is_watermarked,
                created_at,
            )| {
                to_response(
                    Message {
                        id,
                        project_id,
                        sender_id,
                        content,
                        kind,
                        image_url,
                        file_name,
                        is_watermarked,
                        created_at,
                    },
                    sender_name,
                    completed,
                )
            },
        )
        .collect();

    Ok(Json(MessageListResponse {
        messages,
        project_completed: completed,
    }))
}

async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse>> {
    check_project_access(&state.db.pool, &body.project_id, &user.id).await?;

    let content = body.content.unwrap_or_default().trim().to_string();
    if content.is_empty() && body.image_url.is_none() {
        return Err(AppError::Validation(
            "Message content or an image is required".to_string(),
        ));
    }

    let completed = project_completed(&state.db.pool, &body.project_id).await?;

    let kind = if body.image_url.is_some() { "image" } else { "text" };
    let is_watermarked = body.image_url.is_some() && !completed;

    let message_id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO messages
            (id, project_id, sender_id, content, kind, image_url, file_name, is_watermarked, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message_id)
    .bind(&body.project_id)
    .bind(&user.id)
    .bind(&content)
    .bind(kind)
    .bind(&body.image_url)
    .bind(&body.file_name)
    .bind(is_watermarked)
    .bind(&now)
    .execute(&state.db.pool)
    .await?;

    Ok(Json(to_response(
        Message {
            id: message_id,
            project_id: body.project_id,
            sender_id: user.id,
            content,
            kind: kind.to_string(),
            image_url: body.image_url,
            file_name: body.file_name,
            is_watermarked,
            created_at: now,
        },
        user.name,
        completed,
    )))
}

async fn upload_attachment(
    State(state): State<AppState>,
    _user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadAttachmentResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let is_image = field
            .content_type()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(AppError::Validation(
                "Please select an image file (JPG, PNG, etc.)".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file {file_name}: {e}")))?;

        let extension = std::path::Path::new(&file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let stored_name = format!("{}.{extension}", Uuid::new_v4());

        let dir = std::path::Path::new(&state.config.storage_path).join("messages");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {e}")))?;

        let path = dir.join(&stored_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file {file_name}: {e}")))?;

        return Ok(Json(UploadAttachmentResponse {
            url: format!("/uploads/messages/{stored_name}"),
            file_name,
        }));
    }

    Err(AppError::Validation("No file provided".to_string()))
}

#[cfg(test)]
mod tests {
    use super::watermark_visible;

    #[test]
    fn watermarked_images_show_the_overlay_until_completion() {
        assert!(watermark_visible(true, false));
    }

    #[test]
    fn completion_clears_the_overlay_regardless_of_the_flag() {
        assert!(!watermark_visible(true, true));
        assert!(!watermark_visible(false, true));
    }

    #[test]
    fn unwatermarked_images_never_show_the_overlay() {
        assert!(!watermark_visible(false, false));
    }
}
