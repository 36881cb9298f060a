//! Authentication Models
//!
//! Data structures for JWT claims and token payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{User, UserWithPassword};

/// Claim value marking an access token
pub const TOKEN_TYPE_ACCESS: &str = "access";

/// Claim value marking a refresh token
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// The identity claims embedded in both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// User ID
    pub user_id: Uuid,
    /// User's display name
    pub name: String,
    /// User's email address
    pub email: String,
    /// User's phone number
    pub phone: String,
    /// User's role
    pub role_id: i32,
}

impl From<&User> for TokenPayload {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role_id: user.role_id,
        }
    }
}

impl From<&UserWithPassword> for TokenPayload {
    fn from(user: &UserWithPassword) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role_id: user.role_id,
        }
    }
}

/// JWT claims structure shared by access and refresh tokens
///
/// Standard claims (`sub`, `exp`, `iat`, `jti`) plus the embedded identity
/// and a `type` discriminator so an access token can never be replayed as a
/// refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - user ID
    pub sub: String,

    /// User's display name
    pub name: String,

    /// User's email address
    pub email: String,

    /// User's phone number
    pub phone: String,

    /// User's role
    pub role_id: i32,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier
    pub jti: String,

    /// Token kind ("access" or "refresh")
    #[serde(rename = "type")]
    pub token_type: String,
}

impl TokenClaims {
    /// Create claims for the given payload and token kind
    pub fn new(
        payload: &TokenPayload,
        token_type: &str,
        expires_at: DateTime<Utc>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: payload.user_id.to_string(),
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone(),
            role_id: payload.role_id,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        }
    }

    /// Extract the identity payload from the claims
    pub fn payload(&self) -> Result<TokenPayload, uuid::Error> {
        Ok(TokenPayload {
            user_id: Uuid::parse_str(&self.sub)?,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role_id: self.role_id,
        })
    }
}
