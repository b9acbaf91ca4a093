/// Post handlers - single-post reads
use crate::error::Result;
use crate::services::PostService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

/// Get a post by ID (bumps the view counter)
pub async fn get_post(pool: web::Data<PgPool>, post_id: web::Path<Uuid>) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    match service.get_post(*post_id).await? {
        Some(post) => Ok(HttpResponse::Ok().json(post)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}
