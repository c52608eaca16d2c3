use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::Resume;
use crate::{error::AppError, id::RecordId};

const RESUME_COLUMNS: &str =
    "id, user_id, file_name, storage_key, content_type, upload_date, tags, is_public";

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn insert(&self, resume: &Resume) -> Result<(), AppError>;
    async fn find(&self, id: RecordId) -> Result<Option<Resume>, AppError>;
    /// Newest first.
    async fn list_by_user(
        &self,
        user_id: RecordId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Resume>, AppError>;
    /// `false` if the resume no longer exists.
    async fn set_public(&self, id: RecordId, public: bool) -> Result<bool, AppError>;
    /// `false` if the resume no longer exists.
    async fn delete(&self, id: RecordId) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgResumeStore {
    db: PgPool,
}

impl PgResumeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn insert(&self, resume: &Resume) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resumes
                (id, user_id, file_name, storage_key, content_type, upload_date, tags, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(resume.id)
        .bind(resume.user_id)
        .bind(&resume.file_name)
        .bind(&resume.key)
        .bind(&resume.content_type)
        .bind(resume.upload_date)
        .bind(&resume.tags)
        .bind(resume.public)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find(&self, id: RecordId) -> Result<Option<Resume>, AppError> {
        let row = sqlx::query_as::<_, Resume>(&format!(
            "SELECT {RESUME_COLUMNS} FROM resumes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_user(
        &self,
        user_id: RecordId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Resume>, AppError> {
        let rows = sqlx::query_as::<_, Resume>(&format!(
            r#"
            SELECT {RESUME_COLUMNS}
              FROM resumes
             WHERE user_id = $1
             ORDER BY upload_date DESC, id DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn set_public(&self, id: RecordId, public: bool) -> Result<bool, AppError> {
        let res = sqlx::query("UPDATE resumes SET is_public = $2 WHERE id = $1")
            .bind(id)
            .bind(public)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete(&self, id: RecordId) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
