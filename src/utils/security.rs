//! Security Utilities
//!
//! Password hashing and OTP code generation.

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::Rng;

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Generate a random 6-digit OTP code in [100000, 999999]
pub fn generate_otp_code() -> String {
    rand::thread_rng().gen_range(100000..=999999).to_string()
}

/// Hash a password using bcrypt with the default cost
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash_password_with_cost(password, DEFAULT_BCRYPT_COST)
}

/// Hash a password with a custom bcrypt cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against its bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// Timing-safe string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_code() {
        let otp = generate_otp_code();
        assert_eq!(otp.len(), 6);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));

        let otp_num: u32 = otp.parse().unwrap();
        assert!((100000..=999999).contains(&otp_num));
    }

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password_with_cost(password, 4).unwrap();

        assert_ne!(hash, password);
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_hashes() {
        // Salting means equal inputs never share a hash.
        let hash1 = hash_password_with_cost("same_password", 4).unwrap();
        let hash2 = hash_password_with_cost("same_password", 4).unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("123456", "123456"));
        assert!(!constant_time_compare("123456", "654321"));
        assert!(!constant_time_compare("123456", "1234567"));
    }
}
