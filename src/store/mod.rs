//! Persistence Boundary
//!
//! Store traits consumed by the service layer, with a PostgreSQL
//! implementation for production and an in-memory implementation for tests
//! and embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::otp::OtpRecord;
use crate::models::user::{NewUser, Role, UserWithPassword};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryOtpStore, InMemoryUserStore};
pub use postgres::{PgOtpStore, PgUserStore};

/// Errors surfaced by store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violation (duplicate email or phone)
    #[error("duplicate record: {0}")]
    Duplicate(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for user accounts and role reference data
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserWithPassword>>;

    /// Look up a user matching either the email or the phone number
    async fn find_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> StoreResult<Option<UserWithPassword>>;

    /// Look up a role by id
    async fn find_role_by_id(&self, role_id: i32) -> StoreResult<Option<Role>>;

    /// Insert a new user record; duplicate email or phone yields
    /// [`StoreError::Duplicate`]
    async fn insert_user(&self, user: NewUser) -> StoreResult<UserWithPassword>;
}

/// Persistence for per-user OTP records
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Fetch the user's live OTP record, if any
    async fn find_by_user_id(&self, user_id: Uuid) -> StoreResult<Option<OtpRecord>>;

    /// Atomically create or overwrite the user's OTP record with a fresh
    /// code and expiry, resetting the verified flag. This is the single
    /// synchronization point guaranteeing at most one live record per user.
    async fn upsert(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<OtpRecord>;

    /// Mark the user's OTP record as verified
    async fn mark_verified(&self, user_id: Uuid) -> StoreResult<()>;
}
