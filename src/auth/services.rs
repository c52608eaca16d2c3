use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    jwt::JwtKeys,
    otp::{generate_otp, otp_matches, OTP_LEN},
    password::{burn_dummy_verification, hash_password, verify_password},
    repo::UserStore,
    repo_types::NewUser,
};
use crate::{error::AppError, id::RecordId, mail::Mailer};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates an unverified user, mails the OTP and returns a session token.
///
/// If the OTP cannot be mailed the new user is deleted again, so a failed
/// signup leaves nothing behind and the email can be reused.
pub async fn signup(
    users: &dyn UserStore,
    mailer: &dyn Mailer,
    keys: &JwtKeys,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(RecordId, String), AppError> {
    let name = name.trim();
    let email = normalize_email(email);

    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("invalid email".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("email already registered"));
    }

    let password_hash = hash_password(password)?;
    let otp = generate_otp(OTP_LEN);
    let user = users
        .create(NewUser {
            id: RecordId::new(),
            name: name.to_string(),
            email: email.clone(),
            password_hash,
            email_otp: otp.clone(),
        })
        .await?;

    let token = keys.issue(user.id)?;

    if let Err(e) = mailer.send_otp(&user.email, &otp).await {
        error!(error = %e, user_id = %user.id, "otp mail failed; removing new user");
        if let Err(cleanup) = users.delete(user.id).await {
            error!(error = %cleanup, user_id = %user.id, "orphan user cleanup failed");
        }
        return Err(AppError::Upstream(e.context("send verification email")));
    }

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((user.id, token))
}

/// Checks credentials and returns a session token. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<String, AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("invalid email".into()));
    }

    let Some(user) = users.find_by_email(&email).await? else {
        burn_dummy_verification(password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn verify_email(
    users: &dyn UserStore,
    user_id: RecordId,
    otp: &str,
) -> Result<(), AppError> {
    let otp = otp.trim();
    if otp.is_empty() {
        return Err(AppError::Validation("otp is required".into()));
    }
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("user not found"))?;
    if user.email_verified || !otp_matches(&user.email_otp, otp) {
        warn!(%user_id, "otp mismatch");
        return Err(AppError::InvalidOtp);
    }
    // the conditional update decides if another request got there first
    if !users.verify_email(user_id, otp).await? {
        warn!(%user_id, "otp consumed concurrently");
        return Err(AppError::InvalidOtp);
    }
    info!(%user_id, "email verified");
    Ok(())
}

/// Replaces the stored OTP with a fresh one and mails it. The previous code
/// stops working immediately.
pub async fn resend_otp(
    users: &dyn UserStore,
    mailer: &dyn Mailer,
    user_id: RecordId,
) -> Result<(), AppError> {
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("user not found"))?;
    if user.email_verified {
        return Err(AppError::AlreadyVerified);
    }

    let otp = generate_otp(OTP_LEN);
    if !users.reset_otp(user_id, &otp).await? {
        // verified between the read and the write
        return Err(AppError::AlreadyVerified);
    }
    mailer
        .send_otp(&user.email, &otp)
        .await
        .map_err(|e| AppError::Upstream(e.context("resend verification email")))?;

    info!(%user_id, "otp resent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryUserStore, RecordingMailer, TestHarness};

    async fn signed_up(h: &TestHarness, email: &str) -> RecordId {
        let (id, _) = signup(
            h.users.as_ref(),
            h.mailer.as_ref(),
            &h.state.jwt,
            "Ada",
            email,
            "password123",
        )
        .await
        .expect("signup");
        id
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no at sign"));
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[tokio::test]
    async fn signup_token_subject_is_the_new_user() {
        let h = TestHarness::new();
        let (id, token) = signup(
            h.users.as_ref(),
            h.mailer.as_ref(),
            &h.state.jwt,
            "Ada",
            "Ada@Example.com",
            "password123",
        )
        .await
        .unwrap();

        assert_eq!(h.state.jwt.validate(&token), Ok(id));
        let user = h.users.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(!user.email_verified);
        assert_eq!(user.email_otp.len(), OTP_LEN);
        assert_eq!(h.mailer.last_otp_for("ada@example.com"), Some(user.email_otp));
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts_and_keeps_first_user() {
        let h = TestHarness::new();
        let first = signed_up(&h, "a@x.com").await;
        let before = h.users.find_by_id(first).await.unwrap().unwrap();

        let err = signup(
            h.users.as_ref(),
            h.mailer.as_ref(),
            &h.state.jwt,
            "Mallory",
            "a@x.com",
            "another-password",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let after = h.users.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.name, "Ada");
        assert_eq!(after.password_hash, before.password_hash);
    }

    #[tokio::test]
    async fn signup_rejects_bad_input() {
        let users = MemoryUserStore::default();
        let mailer = RecordingMailer::default();
        let keys = TestHarness::new().state.jwt.clone();

        for (name, email, password) in [
            ("", "a@x.com", "password123"),
            ("Ada", "not-an-email", "password123"),
            ("Ada", "a@x.com", "short"),
        ] {
            let err = signup(&users, &mailer, &keys, name, email, password)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{name}/{email}");
        }
    }

    #[tokio::test]
    async fn failed_mail_removes_the_new_user() {
        let h = TestHarness::new();
        h.mailer.fail_next();

        let err = signup(
            h.users.as_ref(),
            h.mailer.as_ref(),
            &h.state.jwt,
            "Ada",
            "a@x.com",
            "password123",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(h.users.find_by_email("a@x.com").await.unwrap().is_none());

        // the email is free again
        signed_up(&h, "a@x.com").await;
    }

    #[tokio::test]
    async fn login_does_not_reveal_unknown_email() {
        let h = TestHarness::new();
        signed_up(&h, "a@x.com").await;

        let wrong_pw = login(h.users.as_ref(), &h.state.jwt, "a@x.com", "bad-password")
            .await
            .unwrap_err();
        let unknown = login(h.users.as_ref(), &h.state.jwt, "b@x.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(wrong_pw, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong_pw.to_string(), unknown.to_string());

        let token = login(h.users.as_ref(), &h.state.jwt, " A@x.com", "password123")
            .await
            .unwrap();
        assert!(h.state.jwt.validate(&token).is_ok());
    }

    #[tokio::test]
    async fn otp_verification_lifecycle() {
        let h = TestHarness::new();
        let id = signed_up(&h, "a@x.com").await;
        let otp = h.mailer.last_otp_for("a@x.com").unwrap();
        let wrong = if otp == "000000" { "111111" } else { "000000" };

        let err = verify_email(h.users.as_ref(), id, wrong).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOtp));
        assert!(!h.users.find_by_id(id).await.unwrap().unwrap().email_verified);

        verify_email(h.users.as_ref(), id, &otp).await.unwrap();
        let user = h.users.find_by_id(id).await.unwrap().unwrap();
        assert!(user.email_verified);
        assert!(user.email_otp.is_empty());

        // replay
        let err = verify_email(h.users.as_ref(), id, &otp).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOtp));
    }

    #[tokio::test]
    async fn otp_is_checked_against_the_stored_code_before_updating() {
        let h = TestHarness::new();
        let id = signed_up(&h, "a@x.com").await;
        let otp = h.mailer.last_otp_for("a@x.com").unwrap();

        // surrounding whitespace is ignored
        verify_email(h.users.as_ref(), id, &format!(" {otp} ")).await.unwrap();
        assert!(h.users.find_by_id(id).await.unwrap().unwrap().email_verified);

        let err = verify_email(h.users.as_ref(), RecordId::new(), &otp)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn resend_invalidates_previous_code() {
        let h = TestHarness::new();
        let id = signed_up(&h, "a@x.com").await;
        let first = h.mailer.last_otp_for("a@x.com").unwrap();

        resend_otp(h.users.as_ref(), h.mailer.as_ref(), id).await.unwrap();
        let second = h.mailer.last_otp_for("a@x.com").unwrap();
        assert_eq!(h.mailer.sent_count(), 2);

        if first != second {
            let err = verify_email(h.users.as_ref(), id, &first).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidOtp));
        }
        verify_email(h.users.as_ref(), id, &second).await.unwrap();

        let err = resend_otp(h.users.as_ref(), h.mailer.as_ref(), id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyVerified));
    }
}
