use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::Deserialize;
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::Claims;
use crate::{config::JwtConfig, id::RecordId};

const ALGORITHM: Algorithm = Algorithm::HS256;
const ALGORITHM_NAME: &str = "HS256";

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Why an inbound session token was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    SignatureInvalid,
    #[error("unexpected token algorithm")]
    AlgorithmMismatch,
    #[error("token issuer or audience rejected")]
    ClaimsRejected,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch,
            ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => TokenError::ClaimsRejected,
            _ => TokenError::Malformed,
        }
    }
}

/// Signing and verification keys, built once from config and shared.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes as u64) * 60),
        }
    }

    pub fn issue(&self, user_id: RecordId) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    /// Signs a token as if issued at `now`; expiry is fixed at `now + ttl`.
    pub fn issue_at(&self, user_id: RecordId, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<RecordId, TokenError> {
        self.validate_claims(token).map(|c| c.sub)
    }

    pub fn validate_claims(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_claims_at(token, OffsetDateTime::now_utc())
    }

    /// Validates as of `now`. A token is valid through its `exp` second.
    pub fn validate_claims_at(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<Claims, TokenError> {
        // jsonwebtoken cannot parse unknown algorithms such as "none", so the
        // header is checked by name first.
        if header_algorithm(token)? != ALGORITHM_NAME {
            return Err(TokenError::AlgorithmMismatch);
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.exp < now.unix_timestamp() {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

fn header_algorithm(token: &str) -> Result<String, TokenError> {
    let segment = token.split('.').next().unwrap_or_default();
    let raw = Base64UrlUnpadded::decode_vec(segment).map_err(|_| TokenError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;
    Ok(header.alg)
}
