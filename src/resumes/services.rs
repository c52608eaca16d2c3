use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    access::{authorize, ResumeAction},
    repo::ResumeStore,
    repo_types::Resume,
    text::extract_resume_text,
};
use crate::{error::AppError, id::RecordId, state::AppState};

pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

pub struct UploadItem {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
    pub tags: Vec<String>,
}

/// Fresh blob key per upload; keys are never reused, even after deletion.
pub fn blob_key(owner: RecordId) -> String {
    format!("user-{}-{}", owner, Uuid::new_v4())
}

/// Stores the blob, then the record. If the record cannot be written the
/// blob is removed again.
pub async fn upload_resume(
    st: &AppState,
    owner: RecordId,
    item: UploadItem,
) -> Result<Resume, AppError> {
    if item.body.is_empty() {
        return Err(AppError::Validation("file is empty".into()));
    }

    let key = blob_key(owner);
    let size = item.body.len();
    st.storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .map_err(|e| AppError::Upstream(e.context(format!("upload blob {key}"))))?;

    let resume = Resume {
        id: RecordId::new(),
        user_id: owner,
        file_name: item.file_name,
        key,
        content_type: item.content_type,
        upload_date: OffsetDateTime::now_utc(),
        tags: item.tags,
        public: false,
    };

    if let Err(e) = st.resumes.insert(&resume).await {
        error!(error = %e, key = %resume.key, "resume insert failed; removing blob");
        if let Err(cleanup) = st.storage.delete_object(&resume.key).await {
            warn!(error = %cleanup, key = %resume.key, "orphan blob cleanup failed");
        }
        return Err(e);
    }

    info!(resume_id = %resume.id, user_id = %owner, size, "resume uploaded");
    Ok(resume)
}

/// Loads the resume and runs the ownership / visibility check for `action`.
pub async fn load_authorized(
    resumes: &dyn ResumeStore,
    resume_id: RecordId,
    requester: RecordId,
    action: ResumeAction,
) -> Result<Resume, AppError> {
    let resume = resumes
        .find(resume_id)
        .await?
        .ok_or(AppError::NotFound("resume not found"))?;
    authorize(&resume, requester, action)?;
    Ok(resume)
}

pub async fn download_resume(
    st: &AppState,
    resume_id: RecordId,
    requester: RecordId,
) -> Result<(Resume, Bytes), AppError> {
    let resume =
        load_authorized(st.resumes.as_ref(), resume_id, requester, ResumeAction::Download).await?;
    let body = st
        .storage
        .get_object(&resume.key)
        .await
        .map_err(|e| AppError::Upstream(e.context(format!("download blob {}", resume.key))))?;
    Ok((resume, body))
}

/// The record is the source of truth: once it is gone the resume is gone,
/// and a failed blob delete only leaves an unreachable object behind.
pub async fn delete_resume(
    st: &AppState,
    resume_id: RecordId,
    requester: RecordId,
) -> Result<(), AppError> {
    let resume =
        load_authorized(st.resumes.as_ref(), resume_id, requester, ResumeAction::Delete).await?;
    if !st.resumes.delete(resume.id).await? {
        return Err(AppError::NotFound("resume not found"));
    }
    if let Err(e) = st.storage.delete_object(&resume.key).await {
        warn!(error = %e, key = %resume.key, "blob delete failed after record delete");
    }
    info!(resume_id = %resume.id, "resume deleted");
    Ok(())
}

pub async fn set_visibility(
    resumes: &dyn ResumeStore,
    resume_id: RecordId,
    requester: RecordId,
    public: bool,
) -> Result<(), AppError> {
    let resume =
        load_authorized(resumes, resume_id, requester, ResumeAction::ChangeVisibility).await?;
    if !resumes.set_public(resume.id, public).await? {
        return Err(AppError::NotFound("resume not found"));
    }
    info!(resume_id = %resume.id, public, "resume visibility updated");
    Ok(())
}

pub async fn generate_cover_letter(
    st: &AppState,
    resume_id: RecordId,
    requester: RecordId,
    job_desc: &str,
) -> Result<String, AppError> {
    let resume = load_authorized(
        st.resumes.as_ref(),
        resume_id,
        requester,
        ResumeAction::GenerateCoverLetter,
    )
    .await?;

    let data = st
        .storage
        .get_object(&resume.key)
        .await
        .map_err(|e| AppError::Upstream(e.context(format!("download blob {}", resume.key))))?;
    let text = extract_resume_text(&resume.content_type, data)
        .await
        .map_err(|e| AppError::Upstream(e.context("failed to parse resume text")))?;
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "resume contains no extractable text".into(),
        ));
    }

    let letter = st
        .llm
        .generate_cover_letter(job_desc, &text)
        .await
        .map_err(|e| AppError::Upstream(e.context("failed to generate cover letter")))?;
    info!(resume_id = %resume.id, "cover letter generated");
    Ok(letter)
}
