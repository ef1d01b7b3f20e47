use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full user record as stored, including the password hash.
///
/// This shape never leaves the credential-handling code: everything downstream
/// of login/registration works with the [`User`] projection instead. It
/// deliberately does not derive `Serialize`, so the hash cannot end up in a
/// response body by accident.
#[derive(Debug, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public-safe projection of a user: identity fields only, no credential material.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Drops the password hash, leaving the fields safe to expose.
    pub fn into_public(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

/// Canonical form of an email address: surrounding whitespace removed,
/// lowercased. Applied before every storage lookup or insert so that
/// uniqueness is case-insensitive.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
