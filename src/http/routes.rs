use crate::http;
use actix_web::web;

/// Mount every HTTP sub-module under `/api`.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(http::health::init_routes)
            .configure(http::auth::init_routes)
            .configure(http::grounds::init_routes)
            .configure(http::bookings::init_routes)
            .configure(http::admin::init_routes)
            .configure(http::users::init_routes),
    );
}
