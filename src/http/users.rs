//! Basic user / role management for admins.

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::types::Role;
use crate::db::user_repo;
use crate::error::{AppError, AppResult};
use crate::http::auth::AdminAuth;

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct RoleReq {
    pub role: String,
}

/// GET /api/admin/users
#[get("/admin/users")]
pub async fn list(
    _admin: AdminAuth,
    web::Query(params): web::Query<ListParams>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let limit = params.limit.unwrap_or(100).clamp(1, 500);
    let offset = params.offset.unwrap_or(0).max(0);
    let users = user_repo::list(&db, limit, offset).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// POST /api/admin/users/{id}/role
#[post("/admin/users/{id}/role")]
pub async fn set_role(
    admin: AdminAuth,
    path: web::Path<Uuid>,
    info: web::Json<RoleReq>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let target = path.into_inner();
    if target == admin.0.user_id {
        return Err(AppError::Forbidden("admins cannot change their own role".into()));
    }
    let role: Role = info.role.parse().map_err(AppError::BadRequest)?;

    let user = user_repo::set_role(&db, target, role)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    log::info!("user {} is now {} (by {})", user.id, role.as_str(), admin.0.user_id);
    Ok(HttpResponse::Ok().json(user))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list).service(set_role);
}
