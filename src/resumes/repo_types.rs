use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::id::RecordId;

/// Resume metadata. File bytes live in blob storage under `key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Resume {
    pub id: RecordId,
    pub user_id: RecordId,
    pub file_name: String,
    #[sqlx(rename = "storage_key")]
    pub key: String,
    pub content_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
    pub tags: Vec<String>,
    #[sqlx(rename = "is_public")]
    pub public: bool,
}
