//! PostgreSQL Store Implementations
//!
//! SQLx-backed implementations of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::otp::OtpRecord;
use crate::models::user::{NewUser, Role, UserWithPassword};
use crate::store::{OtpStore, StoreError, StoreResult, UserStore};

/// Map unique-constraint violations on users to [`StoreError::Duplicate`]
fn map_user_insert_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db_err) => match db_err.constraint() {
            Some("users_email_key") => StoreError::Duplicate("email already exists".to_string()),
            Some("users_phone_key") => StoreError::Duplicate("phone already exists".to_string()),
            _ => StoreError::Database(sqlx::Error::Database(db_err)),
        },
        _ => StoreError::Database(e),
    }
}

/// User store backed by PostgreSQL
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserWithPassword>> {
        let user = sqlx::query_as::<_, UserWithPassword>(
            r#"
            SELECT id, name, email, phone, password_hash, role_id, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> StoreResult<Option<UserWithPassword>> {
        let user = sqlx::query_as::<_, UserWithPassword>(
            r#"
            SELECT id, name, email, phone, password_hash, role_id, created_at, updated_at
            FROM users
            WHERE email = $1 OR phone = $2
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_role_by_id(&self, role_id: i32) -> StoreResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<UserWithPassword> {
        let created = sqlx::query_as::<_, UserWithPassword>(
            r#"
            INSERT INTO users (name, email, phone, password_hash, role_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, phone, password_hash, role_id, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_insert_error)?;

        Ok(created)
    }
}

/// OTP store backed by PostgreSQL
#[derive(Clone)]
pub struct PgOtpStore {
    pool: PgPool,
}

impl PgOtpStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for PgOtpStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> StoreResult<Option<OtpRecord>> {
        let record = sqlx::query_as::<_, OtpRecord>(
            r#"
            SELECT user_id, code, verified, expires_at, created_at
            FROM otps
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<OtpRecord> {
        // Single statement so concurrent issues cannot create two records
        // for the same user.
        let record = sqlx::query_as::<_, OtpRecord>(
            r#"
            INSERT INTO otps (user_id, code, verified, expires_at)
            VALUES ($1, $2, FALSE, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET code = EXCLUDED.code,
                verified = FALSE,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING user_id, code, verified, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(code)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn mark_verified(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE otps SET verified = TRUE, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
