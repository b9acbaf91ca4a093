/// Comment handlers - HTTP endpoints for comment operations
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::{CommentService, CommentSort};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Request body for creating a comment
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadQueryParams {
    #[serde(default = "default_thread_sort")]
    pub sort: String,
}

fn default_thread_sort() -> String {
    "best".to_string()
}

/// Create a new comment
pub async fn create_comment(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = CommentService::new((**pool).clone());
    let comment = service
        .create_comment(
            req.post_id,
            user_id.0,
            req.author_name.as_deref(),
            &req.content,
            req.parent_id,
        )
        .await?;

    Ok(HttpResponse::Created().json(comment))
}

/// Soft delete a comment (author only)
pub async fn delete_comment(
    pool: web::Data<PgPool>,
    user_id: UserId,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = CommentService::new((**pool).clone());
    service.delete_comment(*comment_id, user_id.0).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Get the comment thread for a post
pub async fn get_post_comments(
    pool: web::Data<PgPool>,
    post_id: web::Path<Uuid>,
    query: web::Query<ThreadQueryParams>,
) -> Result<HttpResponse> {
    let sort = CommentSort::parse(&query.sort)?;

    let service = CommentService::new((**pool).clone());
    let thread = service.get_thread(*post_id, sort).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "comments": thread })))
}
