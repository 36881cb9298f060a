//! OTP Manager
//!
//! Generation, storage, and validation of one-time passcodes. Each user has
//! at most one live code; issuing again overwrites the previous record.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;

use crate::models::otp::OtpRecord;
use crate::models::user::User;
use crate::service::email::Notifier;
use crate::store::{OtpStore, StoreError};
use crate::utils::security::{constant_time_compare, generate_otp_code};

/// How long an issued code stays valid
pub const DEFAULT_OTP_LIFETIME_MINUTES: i64 = 2;

/// Errors produced by OTP issue and verification
#[derive(Error, Debug)]
pub enum OtpError {
    /// No code has been issued for this user
    #[error("No OTP issued for this user")]
    NotFound,

    /// Submitted code does not match the stored code
    #[error("OTP Mismatched")]
    Mismatch,

    /// Stored code has expired
    #[error("OTP Expired")]
    Expired,

    /// Underlying store failure
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for OTP operations
pub type OtpResult<T> = Result<T, OtpError>;

/// Manages the OTP lifecycle against the OTP store and the notifier
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    notifier: Arc<dyn Notifier>,
    lifetime: Duration,
}

impl OtpService {
    /// Create a manager with the default 2-minute code lifetime
    pub fn new(store: Arc<dyn OtpStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_lifetime(
            store,
            notifier,
            Duration::minutes(DEFAULT_OTP_LIFETIME_MINUTES),
        )
    }

    /// Create a manager with a custom code lifetime
    pub fn with_lifetime(
        store: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
        lifetime: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            lifetime,
        }
    }

    /// Issue a fresh code for the user, overwriting any existing record, and
    /// deliver it by email. Delivery is best-effort: a failed send is logged
    /// and does not fail the operation.
    pub async fn issue(&self, user: &User) -> OtpResult<OtpRecord> {
        let code = generate_otp_code();
        let expires_at = Utc::now() + self.lifetime;

        let record = self.store.upsert(user.id, &code, expires_at).await?;

        let subject = "Your OTP Code";
        let body = format!(
            "Dear {},\n\nYour OTP code is {}. Please use this code to verify your account.\n\nThank you!",
            user.name, code
        );
        if let Err(e) = self.notifier.send(&user.email, subject, &body).await {
            log::warn!("failed to deliver OTP email to {}: {}", user.email, e);
        }

        Ok(record)
    }

    /// Check a submitted code against the user's live record and mark it
    /// verified on success.
    ///
    /// A mismatch is reported before expiry is checked. An already-verified
    /// record stays verifiable until it expires or is overwritten.
    pub async fn verify(&self, user: &User, submitted_code: &str) -> OtpResult<OtpRecord> {
        let mut record = self
            .store
            .find_by_user_id(user.id)
            .await?
            .ok_or(OtpError::NotFound)?;

        if !constant_time_compare(&record.code, submitted_code) {
            return Err(OtpError::Mismatch);
        }

        if record.is_expired() {
            return Err(OtpError::Expired);
        }

        self.store.mark_verified(user.id).await?;
        record.verified = true;

        Ok(record)
    }
}
