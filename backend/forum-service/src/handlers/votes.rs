/// Vote handlers - HTTP endpoints for the vote ledger
use crate::error::{AppError, Result};
use crate::metrics::votes::VOTE_REQUEST_DURATION_SECONDS;
use crate::middleware::UserId;
use crate::models::{VoteTarget, VoteType};
use crate::services::VoteService;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Instant;
use uuid::Uuid;

/// Request body for casting a vote. Exactly one of `post_id` or
/// `comment_id` identifies the target.
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub post_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub vote_type: String,
}

impl VoteRequest {
    fn target(&self) -> Result<VoteTarget> {
        match (self.post_id, self.comment_id) {
            (Some(post_id), None) => Ok(VoteTarget::Post(post_id)),
            (None, Some(comment_id)) => Ok(VoteTarget::Comment(comment_id)),
            (None, None) => Err(AppError::BadRequest(
                "Either post_id or comment_id is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(AppError::BadRequest(
                "Only one of post_id or comment_id may be set".to_string(),
            )),
        }
    }
}

/// Response reporting the resulting ledger state (`voted: false` means the
/// vote was toggled off) plus the updated counters.
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub voted: bool,
    #[serde(rename = "type")]
    pub vote_type: Option<VoteType>,
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Cast, switch, or toggle off a vote
pub async fn apply_vote(
    pool: web::Data<PgPool>,
    user_id: UserId,
    req: web::Json<VoteRequest>,
) -> Result<HttpResponse> {
    let target = req.target()?;
    let requested = VoteType::parse(&req.vote_type).ok_or_else(|| {
        AppError::ValidationError(format!("Invalid vote type '{}'", req.vote_type))
    })?;

    let start = Instant::now();
    let service = VoteService::new((**pool).clone());
    let receipt = service.apply_vote(user_id.0, target, requested).await?;
    VOTE_REQUEST_DURATION_SECONDS
        .with_label_values(&[target.kind()])
        .observe(start.elapsed().as_secs_f64());

    Ok(HttpResponse::Ok().json(VoteResponse {
        voted: receipt.voted,
        vote_type: receipt.vote_type,
        upvotes: receipt.upvotes,
        downvotes: receipt.downvotes,
    }))
}

/// Response for the caller's current vote on a post.
#[derive(Debug, Serialize)]
pub struct VoteStatusResponse {
    pub voted: bool,
    #[serde(rename = "type")]
    pub vote_type: Option<VoteType>,
}

/// Get the caller's current vote on a post
pub async fn get_vote_status(
    pool: web::Data<PgPool>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = VoteService::new((**pool).clone());
    let status = service
        .vote_status(user_id.0, VoteTarget::Post(*post_id))
        .await?;

    Ok(HttpResponse::Ok().json(VoteStatusResponse {
        voted: status.voted,
        vote_type: status.vote_type,
    }))
}
