use tracing::warn;

use super::repo::UserStore;
use crate::{error::AppError, id::RecordId};

/// Passes only if the user exists and has verified their email.
pub async fn require_verified(users: &dyn UserStore, user_id: RecordId) -> Result<(), AppError> {
    match users.find_by_id(user_id).await? {
        Some(user) if user.email_verified => Ok(()),
        Some(_) => {
            warn!(%user_id, "email not verified");
            Err(AppError::Unauthorized)
        }
        None => {
            warn!(%user_id, "token subject has no user record");
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_user, MemoryUserStore};

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let users = MemoryUserStore::default();
        let err = require_verified(&users, RecordId::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn unverified_user_is_rejected_and_verified_user_passes() {
        let users = MemoryUserStore::default();
        let unverified = seed_user(&users, "a@x.com", false).await;
        let verified = seed_user(&users, "b@x.com", true).await;

        assert!(matches!(
            require_verified(&users, unverified.id).await,
            Err(AppError::Unauthorized)
        ));
        assert!(require_verified(&users, verified.id).await.is_ok());
    }
}
