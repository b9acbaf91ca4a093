/// HTTP middleware utilities for forum-service
///
/// Provides JWT authentication, Redis-backed rate limiting, and simple
/// request metrics logging. Token issuance lives in the external auth
/// service; the middleware here only validates bearer tokens and exposes
/// the verified caller identity to handlers.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::{ErrorTooManyRequests, ErrorUnauthorized};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use redis::aio::ConnectionManager;
use serde::Deserialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

// =====================================================================
// JWT Authentication
// =====================================================================

/// Extracted user identifier stored in request extensions after auth.
#[derive(Debug, Clone)]
pub struct UserId(pub Uuid);

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// Actix middleware that validates a Bearer token with a shared secret.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    decoding_key: Arc<DecodingKey>,
}

impl JwtAuthMiddleware {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            decoding_key: self.decoding_key.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    decoding_key: Arc<DecodingKey>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = futures::future::LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let decoding_key = self.decoding_key.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| ErrorUnauthorized("Missing Authorization header"))?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or_else(|| ErrorUnauthorized("Invalid Authorization scheme"))?;

            let claims = decode::<Claims>(
                token,
                &decoding_key,
                &Validation::new(Algorithm::HS256),
            )
            .map_err(|_| ErrorUnauthorized("Invalid or expired token"))?;

            let user_id = Uuid::parse_str(&claims.claims.sub)
                .map_err(|_| ErrorUnauthorized("Invalid user ID"))?;

            req.extensions_mut().insert(UserId(user_id));

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("User ID missing")),
        )
    }
}

// =====================================================================
// Rate limiting
// =====================================================================

#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_seconds: 60,
        }
    }
}

pub struct RateLimiter {
    redis: ConnectionManager,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(redis: ConnectionManager, config: RateLimitConfig) -> Self {
        Self { redis, config }
    }

    pub async fn is_rate_limited(&self, client_id: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.redis.clone();
        let key = format!("rate_limit:{}", client_id);

        // Atomic INCR + set TTL once using Lua script (prevents TOCTOU)
        const LUA: &str = r#"
            local current = redis.call('INCR', KEYS[1])
            if current == 1 then
                redis.call('EXPIRE', KEYS[1], ARGV[1])
            end
            return current
        "#;

        let count: i64 = redis::cmd("EVAL")
            .arg(LUA)
            .arg(1)
            .arg(&key)
            .arg(self.config.window_seconds as i64)
            .query_async(&mut conn)
            .await?;

        Ok(count as u32 > self.config.max_requests)
    }
}

#[derive(Clone)]
pub struct RateLimitMiddleware {
    rate_limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(rate_limiter: RateLimiter) -> Self {
        Self {
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            rate_limiter: self.rate_limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    rate_limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = futures::future::LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client_id = req
            .extensions()
            .get::<UserId>()
            .map(|id| format!("user:{}", id.0))
            .unwrap_or_else(|| {
                req.connection_info()
                    .realip_remote_addr()
                    .map(|ip| format!("ip:{}", ip))
                    .unwrap_or_else(|| "ip:unknown".to_string())
            });

        let service = self.service.clone();
        let limiter = self.rate_limiter.clone();

        Box::pin(async move {
            match limiter.is_rate_limited(&client_id).await {
                Ok(true) => Err(ErrorTooManyRequests("Too many requests")),
                Ok(false) => service.call(req).await,
                Err(err) => {
                    tracing::warn!("Rate limiter unavailable: {}", err);
                    service.call(req).await
                }
            }
        })
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = futures::future::LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed().as_millis();
            tracing::debug!(%method, %path, %elapsed, "request completed");
            res
        })
    }
}
