/// Configuration management for Forum Service
///
/// This module handles loading and managing configuration from environment
/// variables.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Cache (Redis) configuration
    pub cache: CacheConfig,
    /// JWT validation configuration
    pub auth: AuthConfig,
    /// Ranking configuration
    pub ranking: RankingConfig,
    /// Counter reconciliation configuration
    pub reconciler: ReconcilerConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL
    pub url: String,
}

/// JWT validation configuration. Token issuance lives in the auth service;
/// this service only verifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Ranking configuration.
///
/// The hot weights and the decay constant are the observable ranking
/// behavior; they are loaded from the environment with the historical
/// defaults rather than hardcoded, so deployments can pin them explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub hot_upvote_weight: f64,
    pub hot_comment_weight: f64,
    pub hot_decay_per_ms: f64,
    pub hot_window_hours: i64,
    pub trending_window_hours: i64,
    /// Upper bound on the snapshot the feed ranks over.
    pub max_candidates: i64,
}

/// Counter reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    pub interval_secs: u64,
    pub enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("FORUM_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("FORUM_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8084),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if app_env.eq_ignore_ascii_case("production") && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/tribune".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            cache: CacheConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            auth: {
                let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();
                if app_env.eq_ignore_ascii_case("production") && jwt_secret.trim().is_empty() {
                    return Err("JWT_SECRET must be set in production".to_string());
                }

                AuthConfig {
                    jwt_secret: if jwt_secret.is_empty() {
                        "dev-secret".to_string()
                    } else {
                        jwt_secret
                    },
                }
            },
            ranking: RankingConfig {
                hot_upvote_weight: parse_env_or_default("RANKING_HOT_UPVOTE_WEIGHT", 2.0)?,
                hot_comment_weight: parse_env_or_default("RANKING_HOT_COMMENT_WEIGHT", 3.0)?,
                hot_decay_per_ms: parse_env_or_default("RANKING_HOT_DECAY_PER_MS", 0.0001)?,
                hot_window_hours: std::env::var("RANKING_HOT_WINDOW_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(168),
                trending_window_hours: std::env::var("RANKING_TRENDING_WINDOW_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(24),
                max_candidates: std::env::var("RANKING_MAX_CANDIDATES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1_000),
            },
            reconciler: ReconcilerConfig {
                interval_secs: std::env::var("RECONCILER_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3_600),
                enabled: std::env::var("RECONCILER_ENABLED")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(true),
            },
        })
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            hot_upvote_weight: 2.0,
            hot_comment_weight: 3.0,
            hot_decay_per_ms: 0.0001,
            hot_window_hours: 168,
            trending_window_hours: 24,
            max_candidates: 1_000,
        }
    }
}

fn parse_env_or_default(key: &str, default: f64) -> Result<f64, String> {
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
