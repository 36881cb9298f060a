//! OTP Models
//!
//! Data structures for OTP-based sign-in for existing users.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A user's one-time passcode record.
///
/// There is at most one live record per user; re-issuing overwrites the
/// existing record in place and resets the verified flag.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OtpRecord {
    /// The user this code belongs to (one record per user)
    pub user_id: Uuid,
    /// 6-digit numeric OTP code
    pub code: String,
    /// Whether the code has been successfully verified
    pub verified: bool,
    /// When the code expires
    pub expires_at: DateTime<Utc>,
    /// When the record was first created
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Check whether the code has expired. Expiry is inclusive: a code is
    /// dead the moment `expires_at` is reached.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Remaining time until expiration in seconds
    pub fn remaining_seconds(&self) -> i64 {
        let now = Utc::now();
        if now >= self.expires_at {
            0
        } else {
            (self.expires_at - now).num_seconds()
        }
    }
}
