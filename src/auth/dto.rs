use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub otp: String,
}

/// Returned after signup or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct EmailVerifiedResponse {
    pub email_verified: bool,
}

#[derive(Debug, Serialize)]
pub struct OtpResentResponse {
    pub otp_resent: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
}
