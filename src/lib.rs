//! Authentication Service Library
//!
//! A user authentication service providing registration, password-based
//! login, one-time-passcode (OTP) email sign-in, and JWT access/refresh
//! token issuance and renewal.
//!
//! # Features
//!
//! - **Password Security**: bcrypt hashing with configurable cost factors
//! - **OTP Sign-In**: 6-digit time-boxed codes, one live code per user,
//!   delivered by email
//! - **Stateless Tokens**: HS256 access/refresh JWTs with injected secrets,
//!   no server-side session state
//! - **Pluggable Persistence**: store traits with PostgreSQL (SQLx) and
//!   in-memory implementations
//! - **Typed Failures**: every flow maps each failure path to a specific
//!   error variant with an HTTP-ready response mapping
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use auth_service::{
//!     AppConfig, AuthService, EmailService, LoginRequest, OtpService,
//!     PgOtpStore, PgUserStore, TokenService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     config.validate()?;
//!
//!     let pool = config.database.create_pool().await?;
//!     let email = Arc::new(EmailService::new(
//!         config.email.clone().expect("SMTP not configured"),
//!     )?);
//!
//!     let auth_service = AuthService::new(
//!         Arc::new(PgUserStore::new(pool.clone())),
//!         OtpService::new(Arc::new(PgOtpStore::new(pool)), email),
//!         TokenService::new(&config.jwt),
//!     );
//!
//!     let response = auth_service
//!         .login(LoginRequest {
//!             email: "alice@example.com".to_string(),
//!             password: "secret".to_string(),
//!         })
//!         .await?;
//!     println!("signed in: {} ({})", response.user.name, response.user.email);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Service Layer**: auth orchestrator, OTP manager, token codec, email
//!   notifier
//! - **Store Layer**: `UserStore`/`OtpStore` traits with PostgreSQL and
//!   in-memory implementations
//! - **Models**: entities, token claims, request/response types
//! - **Utils**: error types, password hashing, input validation
//!
//! The HTTP layer is intentionally out of scope: flows take request structs
//! and return `Result`s whose error type already carries its HTTP mapping.

/// Configuration management for all service settings
pub mod config;

/// Database connection management and configuration
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Business logic for the authentication flows
pub mod service;

/// Persistence boundary: store traits and implementations
pub mod store;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use config::{AppConfig, EmailConfig, JwtConfig, OtpConfig};
pub use database::{DatabaseConfig, DatabasePool};
pub use models::{
    auth::{TokenClaims, TokenPayload},
    otp::OtpRecord,
    requests::{
        LoginRequest, LoginResponse, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
        SendOtpRequest, SendOtpResponse, SuccessResponse, VerifyOtpRequest,
    },
    user::{NewUser, Role, User, RESERVED_ROLE_ID},
};
pub use service::{
    AuthError, AuthResult, AuthService, EmailService, Notifier, OtpError, OtpService, TokenError,
    TokenService,
};
pub use store::{
    InMemoryOtpStore, InMemoryUserStore, OtpStore, PgOtpStore, PgUserStore, StoreError,
    UserStore,
};
pub use utils::error::{AppError, AppResult, ErrorResponse};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
