use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::booking::types::Role;
use crate::db::models::User;

const USER_COLUMNS: &str = "id, email, role, full_name, phone, created_at";

/// Insert the user on first login, otherwise return the existing row.
pub async fn upsert_by_email(db: &PgPool, email: &str) -> Result<User> {
    sqlx::query_as::<_, User>(&format!(
        r#"INSERT INTO users (email)
           VALUES ($1)
           ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
           RETURNING {USER_COLUMNS}"#
    ))
    .bind(email.trim().to_lowercase())
    .fetch_one(db)
    .await
    .context("upserting user")
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching user")
}

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("listing users")
}

/// Returns the updated user, or `None` when no such user exists.
pub async fn set_role(db: &PgPool, id: Uuid, role: Role) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(role.as_str())
    .fetch_optional(db)
    .await
    .context("updating user role")
}

/// Promote to admin when the email is on the configured admin list.
pub async fn promote_if_listed(db: &PgPool, user: User, admin_emails: &[String]) -> Result<User> {
    if user.role().is_admin() || !admin_emails.iter().any(|e| *e == user.email) {
        return Ok(user);
    }
    log::info!("promoting {} to admin (ADMIN_EMAILS)", user.email);
    Ok(set_role(db, user.id, Role::Admin).await?.unwrap_or(user))
}

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    full_name: Option<&str>,
    phone: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "UPDATE users
            SET full_name = COALESCE($2, full_name),
                phone     = COALESCE($3, phone)
          WHERE id = $1",
    )
    .bind(id)
    .bind(full_name)
    .bind(phone)
    .execute(db)
    .await
    .context("updating profile")?;
    Ok(())
}
