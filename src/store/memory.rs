//! In-Memory Store Implementations
//!
//! Mutex-guarded implementations of the store traits for tests and for
//! embedding the service without a database. Mutations take the lock for
//! their whole duration, so the one-record-per-user OTP invariant holds
//! under concurrent use just as it does with the PostgreSQL upsert.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::otp::OtpRecord;
use crate::models::user::{NewUser, Role, UserWithPassword};
use crate::store::{OtpStore, StoreError, StoreResult, UserStore};

/// User store holding records in process memory
pub struct InMemoryUserStore {
    users: Mutex<Vec<UserWithPassword>>,
    roles: Vec<Role>,
}

impl InMemoryUserStore {
    /// Create a store seeded with the standard role table (1 = admin,
    /// 2 = user)
    pub fn new() -> Self {
        Self::with_roles(vec![
            Role {
                id: 1,
                name: "admin".to_string(),
            },
            Role {
                id: 2,
                name: "user".to_string(),
            },
        ])
    }

    /// Create a store with a custom role table
    pub fn with_roles(roles: Vec<Role>) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            roles,
        }
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserWithPassword>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> StoreResult<Option<UserWithPassword>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email == email || u.phone == phone)
            .cloned())
    }

    async fn find_role_by_id(&self, role_id: i32) -> StoreResult<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.id == role_id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<UserWithPassword> {
        let mut users = self.users.lock().unwrap();

        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email already exists".to_string()));
        }
        if users.iter().any(|u| u.phone == user.phone) {
            return Err(StoreError::Duplicate("phone already exists".to_string()));
        }

        let now = Utc::now();
        let created = UserWithPassword {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role_id: user.role_id,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());

        Ok(created)
    }
}

/// OTP store holding records in process memory, keyed by user id
pub struct InMemoryOtpStore {
    records: Mutex<HashMap<Uuid, OtpRecord>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored OTP records
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl Default for InMemoryOtpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> StoreResult<Option<OtpRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(&user_id).cloned())
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<OtpRecord> {
        let mut records = self.records.lock().unwrap();

        let record = records
            .entry(user_id)
            .and_modify(|existing| {
                existing.code = code.to_string();
                existing.verified = false;
                existing.expires_at = expires_at;
            })
            .or_insert_with(|| OtpRecord {
                user_id,
                code: code.to_string(),
                verified: false,
                expires_at,
                created_at: Utc::now(),
            });

        Ok(record.clone())
    }

    async fn mark_verified(&self, user_id: Uuid) -> StoreResult<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(&user_id) {
            record.verified = true;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "hash".to_string(),
            role_id: 2,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = InMemoryUserStore::new();
        let created = store
            .insert_user(new_user("a@x.com", "555"))
            .await
            .unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_phone = store
            .find_by_email_or_phone("other@x.com", "555")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_phone.id, created.id);

        assert!(store.find_by_email("missing@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_and_phone_rejected() {
        let store = InMemoryUserStore::new();
        store
            .insert_user(new_user("a@x.com", "555"))
            .await
            .unwrap();

        let same_email = store.insert_user(new_user("a@x.com", "666")).await;
        assert!(matches!(same_email, Err(StoreError::Duplicate(_))));

        let same_phone = store.insert_user(new_user("b@x.com", "555")).await;
        assert!(matches!(same_phone, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_role_lookup() {
        let store = InMemoryUserStore::new();
        let role = store.find_role_by_id(2).await.unwrap().unwrap();
        assert_eq!(role.name, "user");
        assert!(store.find_role_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_otp_upsert_overwrites_in_place() {
        let store = InMemoryOtpStore::new();
        let user_id = Uuid::new_v4();
        let expires = Utc::now() + Duration::minutes(2);

        let first = store.upsert(user_id, "111111", expires).await.unwrap();
        assert_eq!(first.code, "111111");
        assert!(!first.verified);

        store.mark_verified(user_id).await.unwrap();

        let second = store.upsert(user_id, "222222", expires).await.unwrap();
        assert_eq!(second.code, "222222");
        // Overwrite resets the verified flag.
        assert!(!second.verified);
        assert_eq!(store.record_count(), 1);
    }
}
