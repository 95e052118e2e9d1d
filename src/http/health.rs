//! Readiness probe covering both backing stores.

use actix_web::{get, web, HttpResponse};
use redis::{AsyncCommands, Client as RedisClient};
use serde::Serialize;
use sqlx::PgPool;

use crate::cache;

#[derive(Serialize)]
struct Health {
    postgres: bool,
    redis: bool,
    cached_grounds: usize,
}

async fn redis_ok(redis: &RedisClient) -> bool {
    match redis.get_multiplexed_async_connection().await {
        Ok(mut conn) => conn.ping::<String>().await.is_ok(),
        Err(_) => false,
    }
}

/// 200 when Postgres and Redis both answer, 503 otherwise.
#[get("/healthz")]
pub async fn healthz(db: web::Data<PgPool>, redis: web::Data<RedisClient>) -> HttpResponse {
    let health = Health {
        postgres: sqlx::query("SELECT 1").execute(&**db).await.is_ok(),
        redis: redis_ok(&redis).await,
        cached_grounds: cache::GROUNDS.len(),
    };

    if health.postgres && health.redis {
        HttpResponse::Ok().json(health)
    } else {
        HttpResponse::ServiceUnavailable().json(health)
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
