use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::id::RecordId;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub email_otp: String, // empty once verified
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields supplied at signup; everything else starts at its default.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub email_otp: String,
}
