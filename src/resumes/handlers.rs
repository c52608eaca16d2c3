use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue,
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    dto::{
        CoverLetterResponse, GenerateCoverLetterRequest, MessageResponse, Pagination,
        ResumeListResponse, UploadResponse, VisibilityQuery, VisibilityResponse,
    },
    services::{self, UploadItem, DEFAULT_CONTENT_TYPE},
};
use crate::{
    auth::extractors::VerifiedUser,
    error::{AppError, AppJson, AppQuery},
    id::RecordId,
    state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/list-resumes", get(list_resumes))
        .route("/download-resume/:resume_id", get(download_resume))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/upload-resume", put(upload_resume))
        .route("/delete-resume/:resume_id", delete(delete_resume))
        .route(
            "/update-resume-visibility/:resume_id",
            post(update_visibility),
        )
        .route("/generate-cover-letter", post(generate_cover_letter))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// PUT /upload-resume (multipart)
/// Fields: `file` (required), `tags` / `tags[]` (repeatable).
#[instrument(skip(state, multipart))]
pub async fn upload_resume(
    State(state): State<AppState>,
    VerifiedUser(user_id): VerifiedUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut mp = multipart?;
    let mut file: Option<(String, String, bytes::Bytes)> = None;
    let mut tags = Vec::new();

    while let Some(field) = mp.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "resume".into());
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.into());
                let data = field.bytes().await?;
                file = Some((file_name, content_type, data));
            }
            Some("tags") | Some("tags[]") => {
                let tag = field.text().await?;
                let tag = tag.trim();
                if !tag.is_empty() {
                    tags.push(tag.to_string());
                }
            }
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }

    let (file_name, content_type, body) =
        file.ok_or_else(|| AppError::Validation("file is required".into()))?;

    let resume = services::upload_resume(
        &state,
        user_id,
        UploadItem {
            file_name,
            content_type,
            body,
            tags,
        },
    )
    .await?;
    Ok(Json(UploadResponse { resume }))
}

#[instrument(skip(state))]
pub async fn list_resumes(
    State(state): State<AppState>,
    VerifiedUser(user_id): VerifiedUser,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let (limit, offset) = page.clamped();
    let resumes = state.resumes.list_by_user(user_id, limit, offset).await?;
    Ok(Json(ResumeListResponse { resumes }))
}

#[instrument(skip(state))]
pub async fn download_resume(
    State(state): State<AppState>,
    VerifiedUser(user_id): VerifiedUser,
    Path(resume_id): Path<String>,
) -> Result<Response, AppError> {
    let resume_id: RecordId = resume_id.parse()?;
    let (resume, body) = services::download_resume(&state, resume_id, user_id).await?;

    let content_type = HeaderValue::from_str(&resume.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&resume.file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)],
        Body::from(body),
    )
        .into_response())
}

#[instrument(skip(state))]
pub async fn delete_resume(
    State(state): State<AppState>,
    VerifiedUser(user_id): VerifiedUser,
    Path(resume_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let resume_id: RecordId = resume_id.parse()?;
    services::delete_resume(&state, resume_id, user_id).await?;
    Ok(Json(MessageResponse {
        message: "resume deleted".into(),
    }))
}

#[instrument(skip(state))]
pub async fn update_visibility(
    State(state): State<AppState>,
    VerifiedUser(user_id): VerifiedUser,
    Path(resume_id): Path<String>,
    AppQuery(query): AppQuery<VisibilityQuery>,
) -> Result<Json<VisibilityResponse>, AppError> {
    let resume_id: RecordId = resume_id.parse()?;
    let public = query.is_public()?;
    services::set_visibility(state.resumes.as_ref(), resume_id, user_id, public).await?;
    Ok(Json(VisibilityResponse {
        message: "resume visibility updated".into(),
        public,
    }))
}

#[instrument(skip(state, payload))]
pub async fn generate_cover_letter(
    State(state): State<AppState>,
    VerifiedUser(user_id): VerifiedUser,
    AppJson(payload): AppJson<GenerateCoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    if payload.resume_id.trim().is_empty() {
        return Err(AppError::Validation("resume_id is required".into()));
    }
    let resume_id: RecordId = payload.resume_id.trim().parse()?;
    let cover_letter =
        services::generate_cover_letter(&state, resume_id, user_id, &payload.job_desc).await?;
    Ok(Json(CoverLetterResponse { cover_letter }))
}

/// `attachment; filename="..."` with quotes, backslashes and control
/// characters dropped from the stored name.
fn content_disposition(file_name: &str) -> String {
    let clean: String = file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    let clean = clean.trim();
    let name = if clean.is_empty() { "resume" } else { clean };
    format!("attachment; filename=\"{name}\"")
}
