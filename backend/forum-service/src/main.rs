use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use chrono::Utc;
use forum_service::jobs::counter_reconciler::CounterReconcilerJob;
use forum_service::middleware::{JwtAuthMiddleware, RateLimitConfig, RateLimitMiddleware, RateLimiter};
use forum_service::{handlers, metrics};
use redis::aio::ConnectionManager;
use redis::RedisError;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::io;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: sqlx::Pool<sqlx::Postgres>,
    redis_manager: ConnectionManager,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    fn new(db_pool: sqlx::Pool<sqlx::Postgres>, redis_manager: ConnectionManager) -> Self {
        Self {
            db_pool,
            redis_manager,
        }
    }

    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }

    async fn check_redis(&self) -> Result<(), RedisError> {
        let mut conn = self.redis_manager.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(RedisError::from((
                redis::ErrorKind::ResponseError,
                "unexpected PING response",
            )))
        }
    }
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "forum-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "forum-service"
        })),
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();
    let mut ready = true;

    let start = Instant::now();
    let pg_result = state.check_postgres().await;
    let pg_latency = Some(start.elapsed().as_millis() as u64);
    let postgres_check = match pg_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "PostgreSQL connection successful".to_string(),
            latency_ms: pg_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms: pg_latency,
            }
        }
    };
    checks.insert("postgresql".to_string(), postgres_check);

    let start = Instant::now();
    let redis_result = state.check_redis().await;
    let redis_latency = Some(start.elapsed().as_millis() as u64);
    let redis_check = match redis_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Redis ping successful".to_string(),
            latency_ms: redis_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Redis ping failed: {}", e),
                latency_ms: redis_latency,
            }
        }
    };
    checks.insert("redis".to_string(), redis_check);

    let status = if ready {
        ComponentStatus::Healthy
    } else {
        ComponentStatus::Unhealthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match forum_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting forum-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Initialize database connection pool
    let db_pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migration failed: {e}")))?;

    tracing::info!("Connected to database, migrations applied");

    // Initialize Redis connection for rate limiting and health checks
    let redis_client = redis::Client::open(config.cache.url.clone()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to initialize Redis client: {e}"),
        )
    })?;
    let redis_manager = ConnectionManager::new(redis_client).await.map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to initialize Redis connection: {e}"),
        )
    })?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    // Background counter reconciliation from the vote ledger
    if config.reconciler.enabled {
        let reconciler = CounterReconcilerJob::new(db_pool.clone(), config.reconciler.interval_secs);
        tokio::spawn(reconciler.run());
    } else {
        tracing::warn!("Counter reconciler disabled; counter drift will not be corrected");
    }

    let health_state = web::Data::new(HealthState::new(db_pool.clone(), redis_manager.clone()));
    let config_data = web::Data::new(config.clone());

    let server = HttpServer::new(move || {
        // Build CORS configuration
        let cors_builder = Cors::default();
        let mut cors = cors_builder;
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let jwt_auth = JwtAuthMiddleware::new(&config.auth.jwt_secret);
        let vote_rate_limiter = RateLimitMiddleware::new(RateLimiter::new(
            redis_manager.clone(),
            RateLimitConfig::default(),
        ));

        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(config_data.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            // Health check endpoints
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .service(
                web::scope("/api/v1")
                    .wrap(forum_service::middleware::MetricsMiddleware)
                    .service(
                        web::scope("/posts")
                            .route("", web::get().to(handlers::get_feed))
                            .service(
                                web::resource("/{post_id}/vote-status")
                                    .wrap(jwt_auth.clone())
                                    .route(web::get().to(handlers::get_vote_status)),
                            )
                            .route(
                                "/{post_id}/comments",
                                web::get().to(handlers::get_post_comments),
                            )
                            .route("/{post_id}", web::get().to(handlers::get_post)),
                    )
                    .service(
                        web::scope("/votes")
                            .wrap(vote_rate_limiter)
                            .wrap(jwt_auth.clone())
                            .route("", web::post().to(handlers::apply_vote)),
                    )
                    .service(
                        web::scope("/comments")
                            .wrap(jwt_auth)
                            .route("", web::post().to(handlers::create_comment))
                            .route(
                                "/{comment_id}",
                                web::delete().to(handlers::delete_comment),
                            ),
                    ),
            )
    })
    .bind(&bind_address)?
    .workers(4)
    .run();

    server.await?;

    tracing::info!("Forum-service shutting down");

    Ok(())
}
