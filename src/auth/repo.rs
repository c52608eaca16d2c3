use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    auth::repo_types::{NewUser, User},
    error::AppError,
    id::RecordId,
};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, email_verified, email_otp, created_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: RecordId) -> Result<Option<User>, AppError>;
    /// Fails with `Conflict` when the email is already registered.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;
    async fn delete(&self, id: RecordId) -> Result<(), AppError>;
    /// Replaces the OTP of an unverified user. `false` if no such user.
    async fn reset_otp(&self, id: RecordId, otp: &str) -> Result<bool, AppError>;
    /// Marks the user verified and clears the OTP if `otp` equals the stored,
    /// non-empty code. `false` if nothing changed.
    async fn verify_email(&self, id: RecordId, otp: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, email_verified, email_otp)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.email_otp)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("email already registered")
            }
            other => AppError::Database(other),
        })
    }

    async fn delete(&self, id: RecordId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn reset_otp(&self, id: RecordId, otp: &str) -> Result<bool, AppError> {
        let res = sqlx::query(
            "UPDATE users SET email_otp = $2 WHERE id = $1 AND email_verified = FALSE",
        )
        .bind(id)
        .bind(otp)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    // Same predicate as `otp::otp_matches`, evaluated atomically in SQL.
    async fn verify_email(&self, id: RecordId, otp: &str) -> Result<bool, AppError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET email_verified = TRUE, email_otp = ''
             WHERE id = $1
               AND email_verified = FALSE
               AND email_otp <> ''
               AND email_otp = $2
            "#,
        )
        .bind(id)
        .bind(otp)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}
