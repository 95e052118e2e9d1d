use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use ground_booking_server::{cache, cleanup, http, http::auth::JwtSecret, metrics};
use redis::Client as RedisClient;
use sqlx::postgres::PgPoolOptions;
use std::{env, time::Duration};
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
    let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
    let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

    // Postgres pool; retried so the server can start alongside its database
    let strategy = ExponentialBackoff::from_millis(200)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(6);
    let db_pool = Retry::spawn(strategy, || {
        PgPoolOptions::new()
            .max_connections(10)
            .connect(&database_url)
    })
    .await
    .context("failed to create Postgres pool")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("running migrations")?;

    // Redis client
    let redis_client = RedisClient::open(redis_url.as_str()).context("invalid REDIS_URL")?;

    cache::warm_all(&db_pool).await;

    // Expire stale pending bookings in the background
    cleanup::start(db_pool.clone(), redis_client.clone());

    log::info!("listening on {server_addr}");
    let secret = web::Data::new(JwtSecret(jwt_secret));
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(redis_client.clone()))
            .app_data(secret.clone())
            .configure(http::routes::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await?;
    Ok(())
}
