//! The `/api` tree as mounted by `main`, exercised up to the point where a
//! handler would need Postgres.

use actix_web::{http::StatusCode, test, web, App};
use chrono::Duration;
use ground_booking_server::{
    booking::types::Role,
    http::{
        auth::{issue_access_token, JwtSecret},
        routes,
    },
};
use redis::Client as RedisClient;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

const SECRET: &str = "routes-secret";

fn bearer(role: Role) -> String {
    let t = issue_access_token(SECRET, Uuid::new_v4(), role, Duration::minutes(5)).unwrap();
    format!("Bearer {t}")
}

macro_rules! booking_app {
    () => {{
        let db = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://127.0.0.1:1/unused")
            .unwrap();
        let redis = RedisClient::open("redis://127.0.0.1:1/").unwrap();
        test::init_service(
            App::new()
                .app_data(web::Data::new(JwtSecret(SECRET.into())))
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(redis))
                .configure(routes::init_routes),
        )
        .await
    }};
}

fn complete_uri() -> String {
    format!("/api/admin/bookings/{}/complete", Uuid::new_v4())
}

#[actix_rt::test]
async fn complete_requires_a_token() {
    let app = booking_app!();
    let req = test::TestRequest::post().uri(&complete_uri()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn complete_is_admin_only() {
    let app = booking_app!();
    let req = test::TestRequest::post()
        .uri(&complete_uri())
        .insert_header(("Authorization", bearer(Role::Customer)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn complete_parses_the_settlement_body_for_admins() {
    let app = booking_app!();
    let req = test::TestRequest::post()
        .uri(&complete_uri())
        .insert_header(("Authorization", bearer(Role::Admin)))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"amount_received\": \"lots\"}")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn invoice_and_stats_are_admin_only() {
    let app = booking_app!();
    for uri in [
        format!("/api/admin/bookings/{}/invoice", Uuid::new_v4()),
        "/api/admin/stats".to_string(),
        "/api/admin/bookings/export.csv".to_string(),
    ] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(("Authorization", bearer(Role::Customer)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[actix_rt::test]
async fn ground_rates_are_capped() {
    let app = booking_app!();
    let req = test::TestRequest::post()
        .uri("/api/admin/grounds")
        .insert_header(("Authorization", bearer(Role::Admin)))
        .set_json(serde_json::json!({
            "name": "Riverside Oval",
            "day_rate": i64::MAX,
            "night_rate": 1500,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/admin/grounds")
        .insert_header(("Authorization", bearer(Role::Admin)))
        .set_json(serde_json::json!({
            "name": "Riverside Oval",
            "day_rate": -1,
            "night_rate": 1500,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
