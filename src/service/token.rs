//! Token Codec
//!
//! Stateless signing and verification of access and refresh JWTs. Secrets
//! and lifetimes are injected at construction; the codec holds no other
//! state and is safe to clone and share across tasks.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::config::JwtConfig;
use crate::models::auth::{TokenClaims, TokenPayload, TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};

/// Errors produced by the token codec
#[derive(Error, Debug)]
pub enum TokenError {
    /// Token could not be signed
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Signature mismatch, malformed token, expiry, or token-type confusion.
    /// All verification failures collapse into this variant so nothing about
    /// the failure mode leaks to the caller.
    #[error("invalid or expired token")]
    InvalidOrExpired,
}

/// Result type for token codec operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Stateless JWT codec with separate access and refresh secrets
#[derive(Clone)]
pub struct TokenService {
    /// JWT access token secret
    access_secret: String,
    /// JWT refresh token secret
    refresh_secret: String,
    /// Access token expiration duration
    access_token_expires_in: Duration,
    /// Refresh token expiration duration
    refresh_token_expires_in: Duration,
}

impl TokenService {
    /// Create a codec from injected configuration
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_token_expires_in: Duration::minutes(config.access_token_expires_minutes),
            refresh_token_expires_in: Duration::days(config.refresh_token_expires_days),
        }
    }

    /// Create a codec with explicit expiration durations
    pub fn with_expiration(
        access_secret: String,
        refresh_secret: String,
        access_expires_in: Duration,
        refresh_expires_in: Duration,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    /// Access token lifetime in seconds, for `expires_in` response fields
    pub fn access_token_lifetime_seconds(&self) -> i64 {
        self.access_token_expires_in.num_seconds()
    }

    /// Sign a short-lived access token carrying the given identity payload
    pub fn issue_access_token(&self, payload: &TokenPayload) -> TokenResult<String> {
        let now = Utc::now();
        let claims = TokenClaims::new(
            payload,
            TOKEN_TYPE_ACCESS,
            now + self.access_token_expires_in,
            now,
        );
        self.encode_token(&claims, &self.access_secret)
    }

    /// Sign a long-lived refresh token carrying the given identity payload
    pub fn issue_refresh_token(&self, payload: &TokenPayload) -> TokenResult<String> {
        let now = Utc::now();
        let claims = TokenClaims::new(
            payload,
            TOKEN_TYPE_REFRESH,
            now + self.refresh_token_expires_in,
            now,
        );
        self.encode_token(&claims, &self.refresh_secret)
    }

    /// Verify an access token and extract its identity payload
    pub fn verify_access_token(&self, token: &str) -> TokenResult<TokenPayload> {
        self.decode_token(token, &self.access_secret, TOKEN_TYPE_ACCESS)
    }

    /// Verify a refresh token and extract its identity payload
    pub fn verify_refresh_token(&self, token: &str) -> TokenResult<TokenPayload> {
        self.decode_token(token, &self.refresh_secret, TOKEN_TYPE_REFRESH)
    }

    fn encode_token(&self, claims: &TokenClaims, secret: &str) -> TokenResult<String> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(secret.as_ref());

        encode(&header, claims, &encoding_key).map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn decode_token(
        &self,
        token: &str,
        secret: &str,
        expected_type: &str,
    ) -> TokenResult<TokenPayload> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let decoding_key = DecodingKey::from_secret(secret.as_ref());

        let claims = decode::<TokenClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidOrExpired)?;

        if claims.token_type != expected_type {
            return Err(TokenError::InvalidOrExpired);
        }

        claims.payload().map_err(|_| TokenError::InvalidOrExpired)
    }
}
