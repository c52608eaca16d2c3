use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            EmailVerifiedResponse, LoginRequest, MessageResponse, OtpResentResponse, PublicUser,
            SignupRequest, TokenResponse, VerifyEmailRequest,
        },
        extractors::AuthUser,
        services,
    },
    error::{AppError, AppJson},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_me))
        .route("/verify-email", post(verify_email))
        .route("/resend-otp", get(resend_otp))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let (_, token) = services::signup(
        state.users.as_ref(),
        state.mailer.as_ref(),
        &state.jwt,
        &payload.name,
        &payload.email,
        &payload.password,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token =
        services::login(state.users.as_ref(), &state.jwt, &payload.email, &payload.password)
            .await?;
    Ok(Json(TokenResponse { token }))
}

/// Tokens are stateless; the client drops its copy.
#[instrument]
pub async fn logout(AuthUser(user_id): AuthUser) -> Json<MessageResponse> {
    tracing::info!(%user_id, "logout");
    Json(MessageResponse {
        message: "Logout successful",
    })
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("user not found"))?;

    Ok(Json(PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
        email_verified: user.email_verified,
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<(StatusCode, Json<EmailVerifiedResponse>), AppError> {
    services::verify_email(state.users.as_ref(), user_id, &payload.otp).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(EmailVerifiedResponse {
            email_verified: true,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn resend_otp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(StatusCode, Json<OtpResentResponse>), AppError> {
    services::resend_otp(state.users.as_ref(), state.mailer.as_ref(), user_id).await?;
    Ok((StatusCode::ACCEPTED, Json(OtpResentResponse { otp_resent: true })))
}
