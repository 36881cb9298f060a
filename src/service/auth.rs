//! Auth Orchestrator
//!
//! Login, registration, OTP sign-in, and token refresh flows. Each flow is
//! stateless across calls except through the injected stores, validates its
//! input, and maps every failure to a specific [`AuthError`] variant.

use std::sync::Arc;

use thiserror::Error;
use validator::Validate;

use crate::models::auth::TokenPayload;
use crate::models::requests::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    SendOtpRequest, SendOtpResponse, VerifyOtpRequest,
};
use crate::models::user::{NewUser, User, RESERVED_ROLE_ID};
use crate::service::otp::{OtpError, OtpService};
use crate::service::token::{TokenError, TokenService};
use crate::store::{StoreError, UserStore};
use crate::utils::error::AppError;
use crate::utils::security::{hash_password_with_cost, verify_password, DEFAULT_BCRYPT_COST};
use crate::utils::validation::normalize_email;

/// Failure taxonomy for the authentication flows
#[derive(Error, Debug)]
pub enum AuthError {
    /// Input validation failed
    #[error("Validation error: {0}")]
    InvalidInput(String),

    /// Requested role is reserved and cannot be self-assigned
    #[error("This role cannot be assigned at registration")]
    ForbiddenRole,

    /// No user with the given email
    #[error("User not found")]
    UserNotFound,

    /// A user with the given email or phone already exists
    #[error("User already exists")]
    AlreadyExists,

    /// Requested role does not exist
    #[error("Role not found")]
    RoleNotFound,

    /// Password did not match the stored hash
    #[error("Incorrect password")]
    InvalidCredentials,

    /// Submitted OTP code did not match
    #[error("OTP Mismatched")]
    OtpMismatch,

    /// Stored OTP code has expired
    #[error("OTP Expired")]
    OtpExpired,

    /// No OTP has been issued for this user
    #[error("No OTP issued for this user")]
    OtpNotFound,

    /// Refresh token failed verification
    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredToken,

    /// Unexpected persistence failure
    #[error("Storage error: {0}")]
    Store(StoreError),

    /// Password hashing failed
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// Token signing failed
    #[error("Token signing error: {0}")]
    TokenSigning(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // A unique-constraint race during registration is still "already
            // exists" to the caller.
            StoreError::Duplicate(_) => AuthError::AlreadyExists,
            other => AuthError::Store(other),
        }
    }
}

impl From<OtpError> for AuthError {
    fn from(err: OtpError) -> Self {
        match err {
            OtpError::NotFound => AuthError::OtpNotFound,
            OtpError::Mismatch => AuthError::OtpMismatch,
            OtpError::Expired => AuthError::OtpExpired,
            OtpError::Store(e) => e.into(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidOrExpired => AuthError::InvalidOrExpiredToken,
            TokenError::Signing(msg) => AuthError::TokenSigning(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(msg) => AppError::Validation(msg),
            AuthError::ForbiddenRole => {
                AppError::Forbidden("This role cannot be assigned at registration".to_string())
            }
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AuthError::AlreadyExists => AppError::Conflict("User already exists".to_string()),
            AuthError::RoleNotFound => AppError::NotFound("Role not found".to_string()),
            AuthError::InvalidCredentials => {
                AppError::Authentication("Incorrect password".to_string())
            }
            AuthError::OtpMismatch => AppError::BadRequest("OTP Mismatched".to_string()),
            AuthError::OtpExpired => AppError::BadRequest("OTP Expired".to_string()),
            AuthError::OtpNotFound => {
                AppError::NotFound("No OTP issued for this user".to_string())
            }
            AuthError::InvalidOrExpiredToken => {
                AppError::Authentication("Invalid or expired refresh token".to_string())
            }
            AuthError::Store(StoreError::Database(e)) => AppError::Database(e),
            AuthError::Store(StoreError::Duplicate(msg)) => AppError::Conflict(msg),
            AuthError::Hashing(e) => AppError::HashingError(e),
            AuthError::TokenSigning(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type for authentication flows
pub type AuthResult<T> = Result<T, AuthError>;

/// Orchestrates the authentication flows over the user store, the OTP
/// manager, and the token codec
pub struct AuthService {
    users: Arc<dyn UserStore>,
    otp: OtpService,
    tokens: TokenService,

    /// bcrypt cost factor for password hashing
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new service with the default bcrypt cost
    pub fn new(users: Arc<dyn UserStore>, otp: OtpService, tokens: TokenService) -> Self {
        Self {
            users,
            otp,
            tokens,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Override the bcrypt cost factor
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Authenticate with email and password, returning the user summary and
    /// a fresh token pair.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginResponse> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let password_valid = verify_password(&request.password, &user.password_hash)?;
        if !password_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let payload = TokenPayload::from(&user);
        self.issue_login_response(user.into(), &payload)
    }

    /// Create a new user account. The password hash never appears in the
    /// response.
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        if request.role_id == RESERVED_ROLE_ID {
            return Err(AuthError::ForbiddenRole);
        }

        let email = normalize_email(&request.email);
        let phone = request.phone.trim().to_string();

        // A match on either field blocks registration.
        if self
            .users
            .find_by_email_or_phone(&email, &phone)
            .await?
            .is_some()
        {
            return Err(AuthError::AlreadyExists);
        }

        self.users
            .find_role_by_id(request.role_id)
            .await?
            .ok_or(AuthError::RoleNotFound)?;

        let password_hash = hash_password_with_cost(&request.password, self.bcrypt_cost)?;

        let user = self
            .users
            .insert_user(NewUser {
                name: request.name.trim().to_string(),
                email,
                phone,
                password_hash,
                role_id: request.role_id,
            })
            .await?;

        Ok(user.into())
    }

    /// Issue an OTP for the user registered under the given email. The code
    /// travels by email only and is never echoed in the response.
    pub async fn send_otp(&self, request: SendOtpRequest) -> AuthResult<SendOtpResponse> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let user: User = user.into();
        let record = self.otp.issue(&user).await?;

        Ok(SendOtpResponse {
            message: "OTP sent".to_string(),
            expires_in: record.remaining_seconds(),
        })
    }

    /// Complete an OTP sign-in: on success, tokens are issued exactly as in
    /// password login.
    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> AuthResult<LoginResponse> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let user: User = user.into();
        self.otp.verify(&user, &request.code).await?;

        let payload = TokenPayload::from(&user);
        self.issue_login_response(user, &payload)
    }

    /// Exchange a valid refresh token for a new access token. The refresh
    /// token itself is not rotated.
    pub async fn refresh_access_token(
        &self,
        request: RefreshTokenRequest,
    ) -> AuthResult<RefreshTokenResponse> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        let payload = self.tokens.verify_refresh_token(&request.refresh_token)?;
        let access_token = self.tokens.issue_access_token(&payload)?;

        Ok(RefreshTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.access_token_lifetime_seconds(),
        })
    }

    fn issue_login_response(
        &self,
        user: User,
        payload: &TokenPayload,
    ) -> AuthResult<LoginResponse> {
        let access_token = self.tokens.issue_access_token(payload)?;
        let refresh_token = self.tokens.issue_refresh_token(payload)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.access_token_lifetime_seconds(),
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::service::email::Notifier;
    use crate::store::{InMemoryOtpStore, InMemoryUserStore, OtpStore};
    use crate::utils::error::AppResult;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct NullNotifier;

    #[async_trait]
    impl Notifier for NullNotifier {
        async fn send(&self, _to_email: &str, _subject: &str, _body: &str) -> AppResult<()> {
            Ok(())
        }
    }

    struct TestHarness {
        service: AuthService,
        users: Arc<InMemoryUserStore>,
        otps: Arc<InMemoryOtpStore>,
        tokens: TokenService,
    }

    fn create_test_harness() -> TestHarness {
        let users = Arc::new(InMemoryUserStore::new());
        let otps = Arc::new(InMemoryOtpStore::new());
        let tokens = TokenService::new(&JwtConfig {
            access_secret: "test_access_secret_key".to_string(),
            refresh_secret: "test_refresh_secret_key".to_string(),
            access_token_expires_minutes: 15,
            refresh_token_expires_days: 30,
        });
        let otp = OtpService::new(otps.clone(), Arc::new(NullNotifier));
        // Low cost keeps the hashing fast in tests.
        let service =
            AuthService::new(users.clone(), otp, tokens.clone()).with_bcrypt_cost(4);

        TestHarness {
            service,
            users,
            otps,
            tokens,
        }
    }

    fn alice_register_request() -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            phone: "555".to_string(),
            password: "pw123".to_string(),
            role_id: 2,
        }
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    // ========================================================================
    // Login
    // ========================================================================

    #[tokio::test]
    async fn test_register_then_login_succeeds() {
        let h = create_test_harness();
        let registered = h.service.register(alice_register_request()).await.unwrap();

        let response = h
            .service
            .login(login_request("a@x.com", "pw123"))
            .await
            .unwrap();

        assert_eq!(response.user.id, registered.id);
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);

        // Both tokens decode to the same user identity.
        let access = h.tokens.verify_access_token(&response.access_token).unwrap();
        let refresh = h
            .tokens
            .verify_refresh_token(&response.refresh_token)
            .unwrap();
        assert_eq!(access.user_id, registered.id);
        assert_eq!(refresh.user_id, registered.id);
        assert_eq!(access.email, "a@x.com");
        assert_eq!(access.role_id, 2);
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let h = create_test_harness();

        let result = h.service.login(login_request("missing@x.com", "pw123")).await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();

        let result = h.service.login(login_request("a@x.com", "wrong")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_email_normalized() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();

        let response = h
            .service
            .login(login_request("A@X.COM", "pw123"))
            .await
            .unwrap();
        assert_eq!(response.user.email, "a@x.com");
    }

    // ========================================================================
    // Register
    // ========================================================================

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();

        let stored = h.users.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw123");
        assert!(verify_password("pw123", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_reserved_role_forbidden() {
        let h = create_test_harness();
        let mut request = alice_register_request();
        request.role_id = RESERVED_ROLE_ID;

        let result = h.service.register(request).await;
        assert!(matches!(result, Err(AuthError::ForbiddenRole)));
        assert_eq!(h.users.user_count(), 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_different_phone() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();

        let mut request = alice_register_request();
        request.phone = "666".to_string();

        let result = h.service.register(request).await;
        assert!(matches!(result, Err(AuthError::AlreadyExists)));
        assert_eq!(h.users.user_count(), 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_phone_different_email() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();

        let mut request = alice_register_request();
        request.email = "b@x.com".to_string();

        let result = h.service.register(request).await;
        assert!(matches!(result, Err(AuthError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_unknown_role() {
        let h = create_test_harness();
        let mut request = alice_register_request();
        request.role_id = 99;

        let result = h.service.register(request).await;
        assert!(matches!(result, Err(AuthError::RoleNotFound)));
    }

    #[tokio::test]
    async fn test_register_invalid_email() {
        let h = create_test_harness();
        let mut request = alice_register_request();
        request.email = "not-an-email".to_string();

        let result = h.service.register(request).await;
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }

    // ========================================================================
    // Send OTP
    // ========================================================================

    #[tokio::test]
    async fn test_send_otp_unknown_email() {
        let h = create_test_harness();

        let result = h
            .service
            .send_otp(SendOtpRequest {
                email: "missing@x.com".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_send_otp_creates_record_without_echoing_code() {
        let h = create_test_harness();
        let user = h.service.register(alice_register_request()).await.unwrap();

        let response = h
            .service
            .send_otp(SendOtpRequest {
                email: "a@x.com".to_string(),
            })
            .await
            .unwrap();

        assert!(response.expires_in > 110 && response.expires_in <= 120);
        let record = h.otps.find_by_user_id(user.id).await.unwrap().unwrap();
        assert!(!response.message.contains(&record.code));
    }

    #[tokio::test]
    async fn test_send_otp_twice_leaves_single_overwritten_record() {
        let h = create_test_harness();
        let user = h.service.register(alice_register_request()).await.unwrap();

        h.service
            .send_otp(SendOtpRequest {
                email: "a@x.com".to_string(),
            })
            .await
            .unwrap();
        h.otps.mark_verified(user.id).await.unwrap();

        h.service
            .send_otp(SendOtpRequest {
                email: "a@x.com".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(h.otps.record_count(), 1);
        let record = h.otps.find_by_user_id(user.id).await.unwrap().unwrap();
        // The second issue replaced the verified first record.
        assert!(!record.verified);
    }

    #[tokio::test]
    async fn test_concurrent_send_otp_single_record() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();

        let request = || SendOtpRequest {
            email: "a@x.com".to_string(),
        };
        let (first, second) = tokio::join!(
            h.service.send_otp(request()),
            h.service.send_otp(request())
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(h.otps.record_count(), 1);
    }

    // ========================================================================
    // Verify OTP
    // ========================================================================

    async fn issue_and_read_code(h: &TestHarness, email: &str) -> String {
        h.service
            .send_otp(SendOtpRequest {
                email: email.to_string(),
            })
            .await
            .unwrap();
        let user = h.users.find_by_email(email).await.unwrap().unwrap();
        h.otps
            .find_by_user_id(user.id)
            .await
            .unwrap()
            .unwrap()
            .code
    }

    #[tokio::test]
    async fn test_verify_otp_success_issues_tokens() {
        let h = create_test_harness();
        let registered = h.service.register(alice_register_request()).await.unwrap();
        let code = issue_and_read_code(&h, "a@x.com").await;

        let response = h
            .service
            .verify_otp(VerifyOtpRequest {
                email: "a@x.com".to_string(),
                code: code.clone(),
            })
            .await
            .unwrap();

        assert_eq!(response.user.id, registered.id);
        let access = h.tokens.verify_access_token(&response.access_token).unwrap();
        assert_eq!(access.user_id, registered.id);

        let record = h
            .otps
            .find_by_user_id(registered.id)
            .await
            .unwrap()
            .unwrap();
        assert!(record.verified);
    }

    #[tokio::test]
    async fn test_verify_otp_replay_within_window_succeeds() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();
        let code = issue_and_read_code(&h, "a@x.com").await;

        let request = || VerifyOtpRequest {
            email: "a@x.com".to_string(),
            code: code.clone(),
        };

        // Verification is not single-use: the same code keeps working until
        // it expires or is overwritten.
        assert!(h.service.verify_otp(request()).await.is_ok());
        assert!(h.service.verify_otp(request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_otp_wrong_code() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();
        let code = issue_and_read_code(&h, "a@x.com").await;
        let wrong_code = if code == "123456" { "654321" } else { "123456" };

        let result = h
            .service
            .verify_otp(VerifyOtpRequest {
                email: "a@x.com".to_string(),
                code: wrong_code.to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::OtpMismatch)));
    }

    #[tokio::test]
    async fn test_verify_otp_expired_code() {
        let h = create_test_harness();
        let user = h.service.register(alice_register_request()).await.unwrap();

        // A code issued 2 minutes and 1 second ago is past its lifetime.
        h.otps
            .upsert(user.id, "123456", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        let result = h
            .service
            .verify_otp(VerifyOtpRequest {
                email: "a@x.com".to_string(),
                code: "123456".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::OtpExpired)));
    }

    #[tokio::test]
    async fn test_verify_otp_without_issue() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();

        let result = h
            .service
            .verify_otp(VerifyOtpRequest {
                email: "a@x.com".to_string(),
                code: "123456".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::OtpNotFound)));
    }

    #[tokio::test]
    async fn test_verify_otp_unknown_email() {
        let h = create_test_harness();

        let result = h
            .service
            .verify_otp(VerifyOtpRequest {
                email: "missing@x.com".to_string(),
                code: "123456".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    #[tokio::test]
    async fn test_refresh_returns_access_token_with_matching_payload() {
        let h = create_test_harness();
        let registered = h.service.register(alice_register_request()).await.unwrap();
        let login = h
            .service
            .login(login_request("a@x.com", "pw123"))
            .await
            .unwrap();

        let response = h
            .service
            .refresh_access_token(RefreshTokenRequest {
                refresh_token: login.refresh_token,
            })
            .await
            .unwrap();

        let payload = h.tokens.verify_access_token(&response.access_token).unwrap();
        assert_eq!(payload.user_id, registered.id);
        assert_eq!(payload.email, "a@x.com");
        assert_eq!(payload.phone, "555");
        assert_eq!(payload.role_id, 2);
    }

    #[tokio::test]
    async fn test_refresh_with_tampered_token() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();
        let login = h
            .service
            .login(login_request("a@x.com", "pw123"))
            .await
            .unwrap();

        let mut tampered = login.refresh_token.clone();
        tampered.pop();
        tampered.push('x');

        let result = h
            .service
            .refresh_access_token(RefreshTokenRequest {
                refresh_token: tampered,
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let h = create_test_harness();
        h.service.register(alice_register_request()).await.unwrap();
        let login = h
            .service
            .login(login_request("a@x.com", "pw123"))
            .await
            .unwrap();

        let result = h
            .service
            .refresh_access_token(RefreshTokenRequest {
                refresh_token: login.access_token,
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredToken)));
    }

    // ========================================================================
    // End to end
    // ========================================================================

    #[tokio::test]
    async fn test_full_signup_login_otp_flow() {
        let h = create_test_harness();

        let user = h.service.register(alice_register_request()).await.unwrap();
        let stored = h.users.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw123");

        let login = h
            .service
            .login(login_request("a@x.com", "pw123"))
            .await
            .unwrap();
        assert!(!login.access_token.is_empty());
        assert!(!login.refresh_token.is_empty());

        h.service
            .send_otp(SendOtpRequest {
                email: "a@x.com".to_string(),
            })
            .await
            .unwrap();
        let record = h.otps.find_by_user_id(user.id).await.unwrap().unwrap();
        let remaining = record.remaining_seconds();
        assert!(remaining > 110 && remaining <= 120);

        let wrong_code = if record.code == "123456" {
            "654321"
        } else {
            "123456"
        };
        let result = h
            .service
            .verify_otp(VerifyOtpRequest {
                email: "a@x.com".to_string(),
                code: wrong_code.to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::OtpMismatch)));
    }

    // ========================================================================
    // Error mapping
    // ========================================================================

    #[test]
    fn test_auth_error_maps_to_app_error() {
        let app: AppError = AuthError::UserNotFound.into();
        assert!(matches!(app, AppError::NotFound(_)));

        let app: AppError = AuthError::ForbiddenRole.into();
        assert!(matches!(app, AppError::Forbidden(_)));

        let app: AppError = AuthError::AlreadyExists.into();
        assert!(matches!(app, AppError::Conflict(_)));

        let app: AppError = AuthError::InvalidCredentials.into();
        assert!(matches!(app, AppError::Authentication(_)));

        let app: AppError = AuthError::OtpMismatch.into();
        assert!(matches!(app, AppError::BadRequest(_)));

        let app: AppError = AuthError::InvalidOrExpiredToken.into();
        assert!(matches!(app, AppError::Authentication(_)));
    }
}
