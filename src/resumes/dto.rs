use serde::{Deserialize, Serialize};

use super::repo_types::Resume;
use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE_SIZE), self.offset.max(0))
    }
}

#[derive(Debug, Deserialize)]
pub struct VisibilityQuery {
    pub public: Option<String>,
}

impl VisibilityQuery {
    /// A missing flag means private; an unrecognised one is rejected.
    pub fn is_public(&self) -> Result<bool, AppError> {
        match self.public.as_deref() {
            None => Ok(false),
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                AppError::Validation(format!("invalid value for public: {raw:?}"))
            }),
        }
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateCoverLetterRequest {
    #[serde(default)]
    pub resume_id: String,
    #[serde(default)]
    pub job_desc: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub resume: Resume,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<Resume>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CoverLetterResponse {
    pub cover_letter: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisibilityResponse {
    pub message: String,
    pub public: bool,
}
