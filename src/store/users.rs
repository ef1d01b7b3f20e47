//! User persistence. Emails are normalized at this boundary so uniqueness is
//! case-insensitive no matter what the caller passes in. Only
//! [`find_user_by_email`] and [`insert_user`] ever touch the password hash;
//! everything else reads the public projection.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{normalize_email, User, UserRecord};

/// Looks up the full credential record for a login check.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>, AppError> {
    let email = normalize_email(email);
    super::bounded(
        "find_user_by_email",
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(pool),
    )
    .await
}

/// Inserts a new user with an already-hashed password.
///
/// A lost race against a concurrent registration for the same email shows up
/// as a unique violation here and is reported the same way as the pre-check.
pub async fn insert_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<UserRecord, AppError> {
    let email = normalize_email(email);
    super::bounded("insert_user", async {
        sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::BadRequest("User already exists with this email".into())
            }
            other => AppError::from(other),
        })
    })
    .await
}

/// Resolves a user id to the public projection. The password hash is not part
/// of the query.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
    super::bounded(
        "find_user_by_id",
        sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool),
    )
    .await
}
