/// Feed handler - the ranked post listing
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::{FeedAlgorithm, FeedQuery, FeedService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    #[serde(default = "default_sort")]
    pub sort: String,
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_sort() -> String {
    "newest".to_string()
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

/// Get the ranked feed page
pub async fn get_feed(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    query: web::Query<FeedQueryParams>,
) -> Result<HttpResponse> {
    let algorithm = FeedAlgorithm::parse(&query.sort)?;

    if let Some(content_type) = query.content_type.as_deref() {
        if content_type != "conspiracy" && content_type != "opinion" {
            return Err(AppError::ValidationError(format!(
                "Invalid content type '{}'",
                content_type
            )));
        }
    }

    if query.page < 1 {
        return Err(AppError::ValidationError("page must be >= 1".to_string()));
    }

    let feed_query = FeedQuery {
        algorithm,
        topic_slug: query.topic.clone(),
        content_type: query.content_type.clone(),
        page: query.page,
        page_size: query.page_size.clamp(1, 100),
    };

    let service = FeedService::new((**pool).clone(), config.ranking.clone());
    let page = service.get_feed(&feed_query).await?;

    Ok(HttpResponse::Ok().json(page))
}
