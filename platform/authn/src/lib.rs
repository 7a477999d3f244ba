//! Bearer token handling.
//!
//! Tokens are HS256 JWTs signed with a shared secret. The service only
//! validates them; `issue_token` backs the development CLI.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use platform_authz::{Role, Subject};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("auth secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
    #[error("authorization header must use the Bearer scheme")]
    BadScheme,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct AuthConfig {
    secret: Vec<u8>,
    pub token_ttl_minutes: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(secret: impl Into<Vec<u8>>, token_ttl_minutes: i64) -> Result<Self, AuthnError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthnError::WeakSecret);
        }
        Ok(Self {
            secret,
            token_ttl_minutes,
        })
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// A caller whose token checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub roles: Vec<Role>,
}

impl Principal {
    /// Unknown role names in the token are ignored.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            roles: claims.roles.iter().filter_map(|r| Role::parse(r)).collect(),
        }
    }
}

/// Turns an optional principal into the authorization subject.
pub fn subject_of(principal: Option<&Principal>) -> Subject {
    match principal {
        Some(principal) => Subject::authenticated(principal.roles.clone()),
        None => Subject::anonymous(),
    }
}

pub fn issue_token(
    subject: &str,
    roles: &[Role],
    config: &AuthConfig,
) -> jsonwebtoken::errors::Result<String> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::minutes(config.token_ttl_minutes))
        .unwrap_or(now)
        .timestamp() as usize;
    let claims = Claims {
        sub: subject.to_string(),
        roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp,
        iat: now.timestamp() as usize,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn decode_token(token: &str, config: &AuthConfig) -> Result<Principal, AuthnError> {
    let data =
        jsonwebtoken::decode::<Claims>(token, &config.decoding_key(), &Validation::default())?;
    Ok(Principal::from_claims(data.claims))
}

/// Resolves an `Authorization` header value. `None` means anonymous;
/// a present but unusable header is an error.
pub fn authenticate(
    header: Option<&str>,
    config: &AuthConfig,
) -> Result<Option<Principal>, AuthnError> {
    let Some(value) = header else {
        return Ok(None);
    };
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthnError::BadScheme)?;
    decode_token(token, config).map(Some)
}
