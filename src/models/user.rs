//! User and Role Models
//!
//! Core user data structures and type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role id reserved for administrators; never assignable through registration.
pub const RESERVED_ROLE_ID: i32 = 1;

/// User representation for external API responses
///
/// This struct represents a user profile without the password hash.
/// All datetime fields use UTC.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// User's display name
    pub name: String,

    /// User's email address (unique, normalized)
    pub email: String,

    /// User's phone number (unique)
    pub phone: String,

    /// Role assigned at registration
    pub role_id: i32,

    /// Timestamp when the user account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user record was last modified
    pub updated_at: DateTime<Utc>,
}

/// Internal user representation including the password hash
///
/// Used by the store layer and credential checks. Never exposed in API
/// responses; the `From<UserWithPassword> for User` conversion strips the
/// hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithPassword {
    /// Unique identifier for the user
    pub id: Uuid,

    /// User's display name
    pub name: String,

    /// User's email address
    pub email: String,

    /// User's phone number
    pub phone: String,

    /// bcrypt hashed password
    pub password_hash: String,

    /// Role assigned at registration
    pub role_id: i32,

    /// Timestamp when the user account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the user record was last modified
    pub updated_at: DateTime<Utc>,
}

impl From<UserWithPassword> for User {
    fn from(user_with_password: UserWithPassword) -> Self {
        User {
            id: user_with_password.id,
            name: user_with_password.name,
            email: user_with_password.email,
            phone: user_with_password.phone,
            role_id: user_with_password.role_id,
            created_at: user_with_password.created_at,
            updated_at: user_with_password.updated_at,
        }
    }
}

/// Insert payload for a new user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role_id: i32,
}

/// Read-only reference data describing a role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
}
