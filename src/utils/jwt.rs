use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of email verification and password reset links.
pub const ACTION_TOKEN_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("token issued for another purpose")]
    WrongPurpose,
}

/// Session token payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub id: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Verify,
    Reset,
}

/// Payload of the single-purpose tokens mailed in verification and reset links.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActionClaims {
    pub id: Uuid,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

/// HMAC keys plus the session lifetime.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(secret: &str, session_ttl_secs: i64) -> Self {
        TokenKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl_secs,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }

    /// Signs a session token carrying `{id, username}`.
    pub fn issue_session(&self, id: Uuid, username: &str) -> Result<String, TokenError> {
        self.issue_session_with_ttl(id, username, self.session_ttl_secs)
    }

    pub fn issue_session_with_ttl(
        &self,
        id: Uuid,
        username: &str,
        ttl_secs: i64,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    pub fn verify_session(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Self::validation())
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    pub fn issue_action(&self, id: Uuid, purpose: TokenPurpose) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = ActionClaims {
            id,
            purpose,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ACTION_TOKEN_TTL_SECS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Decodes a mailed token and checks it was issued for `expected`.
    pub fn verify_action(&self, token: &str, expected: TokenPurpose) -> Result<Uuid, TokenError> {
        let claims = decode::<ActionClaims>(token, &self.decoding, &Self::validation())
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)?;
        if claims.purpose != expected {
            return Err(TokenError::WrongPurpose);
        }
        Ok(claims.id)
    }
}
