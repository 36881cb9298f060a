//! Request and Response Models
//!
//! Data structures for flow request and response payloads with validation.

use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::utils::validation::{
    email_validator, name_validator, otp_code_validator, phone_validator,
};
use validator::Validate;

/// Request payload for password-based login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Registered email address
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Account password
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// Request payload for creating a new user account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// User's display name
    #[validate(custom(function = "name_validator"))]
    pub name: String,

    /// User's email address (must be unique)
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// User's phone number (must be unique)
    #[validate(custom(function = "phone_validator"))]
    pub phone: String,

    /// Account password
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,

    /// Requested role; role 1 is reserved and rejected
    pub role_id: i32,
}

/// Request payload for issuing an OTP to a registered email
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendOtpRequest {
    /// Email address of an existing user
    #[validate(custom(function = "email_validator"))]
    pub email: String,
}

/// Request payload for OTP verification and sign-in
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    /// Email address used for the OTP request
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// 6-digit OTP code received via email
    #[validate(custom(function = "otp_code_validator"))]
    pub code: String,
}

/// Request payload for refreshing access tokens
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    /// Refresh token to exchange for a new access token
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    pub refresh_token: String,
}

/// Response for successful login or OTP sign-in
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Short-lived access token
    pub access_token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token expiration time in seconds
    pub expires_in: i64,
    /// Authenticated user summary (no password hash)
    pub user: User,
}

/// Response for an OTP issue request; the code itself is never echoed
#[derive(Debug, Clone, Serialize)]
pub struct SendOtpResponse {
    pub message: String,
    /// Seconds until the issued code expires
    pub expires_in: i64,
}

/// Response for token refresh operations
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenResponse {
    /// New access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Access token expiration time in seconds
    pub expires_in: i64,
}

/// Standard success response wrapper
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
