//! Magic-link authentication (JWT + refresh) and role extractors.

use actix_web::{get, post, web, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distr::Alphanumeric, Rng};
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::types::Role;
use crate::config::settings;
use crate::db::user_repo;
use crate::error::{AppError, AppResult};

//////////////////////////////////////////////////
// Data structs
//////////////////////////////////////////////////

/// HS256 signing secret, registered as app data.
#[derive(Clone)]
pub struct JwtSecret(pub String);

#[derive(Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct ProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,  // user_id
    role: String, // customer | admin
    exp: usize,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub role: Role,
}

//////////////////////////////////////////////////
// Token helpers
//////////////////////////////////////////////////

pub fn issue_access_token(
    secret: &str,
    user_id: Uuid,
    role: Role,
    ttl: Duration,
) -> anyhow::Result<String> {
    let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn decode_access_token(secret: &str, token: &str) -> Result<(Uuid, Role), AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("invalid / expired token".into()))?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::Unauthorized("bad sub".into()))?;
    let role = data
        .claims
        .role
        .parse::<Role>()
        .map_err(|_| AppError::Unauthorized("bad role".into()))?;
    Ok((user_id, role))
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect()
}

//////////////////////////////////////////////////
// ───────────  JwtAuth / AdminAuth  ─────────────
//////////////////////////////////////////////////

pub mod extractor {
    use super::{decode_access_token, JwtSecret};
    use crate::booking::types::Role;
    use crate::error::AppError;
    use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
    use futures_util::future::{ready, Ready};
    use uuid::Uuid;

    /// Extracts and validates a Bearer-JWT.
    #[derive(Debug, Clone)]
    pub struct JwtAuth {
        pub user_id: Uuid,
        pub role: Role,
    }

    impl JwtAuth {
        pub fn is_admin(&self) -> bool {
            self.role.is_admin()
        }
    }

    fn authenticate(req: &HttpRequest) -> Result<JwtAuth, AppError> {
        // Expect:  Authorization: Bearer <JWT>
        let hdr = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".into()))?;

        let token = hdr
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("malformed Authorization header".into()))?;

        let secret = req
            .app_data::<web::Data<JwtSecret>>()
            .ok_or_else(|| AppError::Unauthorized("server mis-config".into()))?;

        let (user_id, role) = decode_access_token(&secret.0, token)?;
        Ok(JwtAuth { user_id, role })
    }

    impl FromRequest for JwtAuth {
        type Error = AppError;
        type Future = Ready<Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
            ready(authenticate(req))
        }
    }

    /// A [`JwtAuth`] whose token carries the admin role.
    #[derive(Debug, Clone)]
    pub struct AdminAuth(pub JwtAuth);

    impl FromRequest for AdminAuth {
        type Error = AppError;
        type Future = Ready<Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
            let res = authenticate(req).and_then(|auth| {
                if auth.is_admin() {
                    Ok(AdminAuth(auth))
                } else {
                    Err(AppError::Forbidden("admin role required".into()))
                }
            });
            ready(res)
        }
    }
}
pub use extractor::{AdminAuth, JwtAuth};

//////////////////////////////////////////////////
// POST /api/auth/magic_link
//////////////////////////////////////////////////
#[post("/auth/magic_link")]
pub async fn magic_link(
    info: web::Json<MagicLinkRequest>,
    redis: web::Data<RedisClient>,
) -> AppResult<HttpResponse> {
    let email = info.email.trim().to_lowercase();
    if !email.contains('@') || email.len() > 254 {
        return Err(AppError::BadRequest("a valid email is required".into()));
    }

    let token = random_token();
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let _: () = conn
        .set_ex(
            format!("magic:{token}"),
            &email,
            settings().magic_link_ttl_minutes * 60,
        )
        .await?;

    log::info!(
        "Magic link for {}:\n  {}/api/auth/verify?token={}",
        email,
        settings().public_base_url,
        token
    );
    Ok(HttpResponse::Ok().body("Magic link sent; check your email"))
}

//////////////////////////////////////////////////
// GET /api/auth/verify
//////////////////////////////////////////////////
#[get("/auth/verify")]
pub async fn verify(
    query: web::Query<VerifyQuery>,
    redis: web::Data<RedisClient>,
    db: web::Data<PgPool>,
    secret: web::Data<JwtSecret>,
) -> AppResult<HttpResponse> {
    // 1) resolve token → email (single use)
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let key = format!("magic:{}", query.token);
    let email: Option<String> = conn.get(&key).await?;
    let Some(email) = email else {
        return Err(AppError::BadRequest("Invalid or expired token".into()));
    };
    let _: () = conn.del(&key).await.unwrap_or(());

    // 2) upsert user, promote configured admins
    let user = user_repo::upsert_by_email(&db, &email).await?;
    let user = user_repo::promote_if_listed(&db, user, &settings().admin_emails).await?;

    // 3) tokens
    let resp = mint_tokens(&mut conn, &secret.0, user.id, user.role()).await?;
    Ok(HttpResponse::Ok().json(resp))
}

//////////////////////////////////////////////////
// POST /api/auth/refresh
//////////////////////////////////////////////////
#[post("/auth/refresh")]
pub async fn refresh(
    info: web::Json<RefreshRequest>,
    redis: web::Data<RedisClient>,
    db: web::Data<PgPool>,
    secret: web::Data<JwtSecret>,
) -> AppResult<HttpResponse> {
    // 1) consume old refresh → user_id
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let key = format!("refresh:{}", info.refresh_token);
    let uid: Option<String> = conn.get(&key).await?;
    let Some(uid) = uid else {
        return Err(AppError::Unauthorized("invalid refresh".into()));
    };
    let _: () = conn.del(&key).await.unwrap_or(());
    let user_id =
        Uuid::parse_str(&uid).map_err(|_| AppError::Unauthorized("invalid refresh".into()))?;

    // 2) role may have changed since the last token
    let user = user_repo::get(&db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".into()))?;

    let resp = mint_tokens(&mut conn, &secret.0, user.id, user.role()).await?;
    Ok(HttpResponse::Ok().json(resp))
}

async fn mint_tokens(
    conn: &mut redis::aio::MultiplexedConnection,
    secret: &str,
    user_id: Uuid,
    role: Role,
) -> AppResult<TokenResponse> {
    let ttl = Duration::minutes(settings().access_token_ttl_minutes);
    let access_token = issue_access_token(secret, user_id, role, ttl)?;

    let refresh_token = random_token();
    let _: () = conn
        .set_ex(
            format!("refresh:{refresh_token}"),
            user_id.to_string(),
            settings().refresh_token_ttl_days * 24 * 3_600,
        )
        .await?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        expires_in: ttl.num_seconds(),
        role,
    })
}

//////////////////////////////////////////////////
// GET / POST /api/me
//////////////////////////////////////////////////
#[get("/me")]
pub async fn me(auth: JwtAuth, db: web::Data<PgPool>) -> AppResult<HttpResponse> {
    let user = user_repo::get(&db, auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    Ok(HttpResponse::Ok().json(user))
}

#[post("/me/profile")]
pub async fn update_profile(
    auth: JwtAuth,
    info: web::Json<ProfileRequest>,
    db: web::Data<PgPool>,
) -> AppResult<HttpResponse> {
    let name = info.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let phone = info.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    if name.is_some_and(|n| n.chars().count() > 100) {
        return Err(AppError::BadRequest("name must be at most 100 characters".into()));
    }
    user_repo::update_profile(&db, auth.user_id, name, phone).await?;
    Ok(HttpResponse::NoContent().finish())
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(magic_link)
        .service(verify)
        .service(refresh)
        .service(me)
        .service(update_profile);
}
