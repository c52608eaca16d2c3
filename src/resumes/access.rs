use tracing::warn;

use super::repo_types::Resume;
use crate::{error::AppError, id::RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    Download,
    GenerateCoverLetter,
    Delete,
    ChangeVisibility,
}

impl ResumeAction {
    /// Only downloads are opened up by the public flag.
    fn public_allows(self) -> bool {
        matches!(self, ResumeAction::Download)
    }
}

pub fn can_access(resume: &Resume, requester: RecordId, action: ResumeAction) -> bool {
    resume.user_id == requester || (resume.public && action.public_allows())
}

/// Ownership / visibility check against a freshly loaded record.
pub fn authorize(
    resume: &Resume,
    requester: RecordId,
    action: ResumeAction,
) -> Result<(), AppError> {
    if can_access(resume, requester, action) {
        return Ok(());
    }
    warn!(resume_id = %resume.id, %requester, ?action, "resume access denied");
    Err(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    const ALL: [ResumeAction; 4] = [
        ResumeAction::Download,
        ResumeAction::GenerateCoverLetter,
        ResumeAction::Delete,
        ResumeAction::ChangeVisibility,
    ];

    fn resume(owner: RecordId, public: bool) -> Resume {
        Resume {
            id: RecordId::new(),
            user_id: owner,
            file_name: "cv.pdf".into(),
            key: format!("user-{owner}-k"),
            content_type: "application/pdf".into(),
            upload_date: OffsetDateTime::now_utc(),
            tags: vec![],
            public,
        }
    }

    #[test]
    fn owner_may_do_everything() {
        let owner = RecordId::new();
        for public in [false, true] {
            let r = resume(owner, public);
            for action in ALL {
                assert!(authorize(&r, owner, action).is_ok(), "{action:?} public={public}");
            }
        }
    }

    #[test]
    fn stranger_is_denied_everything_on_private_resume() {
        let r = resume(RecordId::new(), false);
        let stranger = RecordId::new();
        for action in ALL {
            assert!(matches!(
                authorize(&r, stranger, action),
                Err(AppError::Unauthorized)
            ));
        }
    }

    #[test]
    fn public_flag_only_opens_download() {
        let r = resume(RecordId::new(), true);
        let stranger = RecordId::new();
        assert!(can_access(&r, stranger, ResumeAction::Download));
        assert!(!can_access(&r, stranger, ResumeAction::GenerateCoverLetter));
        assert!(!can_access(&r, stranger, ResumeAction::Delete));
        assert!(!can_access(&r, stranger, ResumeAction::ChangeVisibility));
    }
}
