//! Configuration Module
//!
//! Centralized configuration for the authentication service: token signing,
//! OTP policy, database, and SMTP settings.

use crate::database::DatabaseConfig;
use crate::service::otp::DEFAULT_OTP_LIFETIME_MINUTES;

/// Environment variable helpers
pub mod env {
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as boolean with default
    pub fn get_bool(key: &str, default: bool) -> bool {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get required environment variable or panic
    pub fn get_required(key: &str) -> String {
        env::var(key).unwrap_or_else(|_| panic!("Required environment variable {} is not set", key))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub jwt: JwtConfig,

    /// OTP policy configuration
    pub otp: OtpConfig,

    /// SMTP configuration; absent when outbound email is not configured
    pub email: Option<EmailConfig>,
}

/// Token signing configuration.
///
/// Secrets are injected into the token codec at construction; nothing in the
/// codec reads the environment.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expires_minutes: i64,
    pub refresh_token_expires_days: i64,
}

/// OTP policy configuration. Codes are always 6 decimal digits.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub lifetime_minutes: i64,
}

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: env::get_required("JWT_ACCESS_SECRET"),
            refresh_secret: env::get_required("JWT_REFRESH_SECRET"),
            access_token_expires_minutes: env::get_i64("JWT_ACCESS_EXPIRES_MINUTES", 15),
            refresh_token_expires_days: env::get_i64("JWT_REFRESH_EXPIRES_DAYS", 30),
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            lifetime_minutes: env::get_i64("OTP_LIFETIME_MINUTES", DEFAULT_OTP_LIFETIME_MINUTES),
        }
    }
}

impl EmailConfig {
    /// Read SMTP settings from the environment; returns None when SMTP is
    /// not configured at all.
    pub fn from_env() -> Option<Self> {
        if !env::is_set("SMTP_HOST") {
            return None;
        }

        Some(Self {
            smtp_host: env::get_required("SMTP_HOST"),
            smtp_port: env::get_u16("SMTP_PORT", 587),
            smtp_username: env::get_required("SMTP_USERNAME"),
            smtp_password: env::get_required("SMTP_PASSWORD"),
            from_name: env::get_string("SMTP_FROM_NAME", "Auth Service"),
            from_email: env::get_required("SMTP_FROM_EMAIL"),
        })
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::default(),
            otp: OtpConfig::default(),
            email: EmailConfig::from_env(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.jwt.access_secret.is_empty() {
            return Err("JWT access secret cannot be empty".into());
        }

        if self.jwt.refresh_secret.is_empty() {
            return Err("JWT refresh secret cannot be empty".into());
        }

        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err("JWT access and refresh secrets must be different".into());
        }

        if self.jwt.access_token_expires_minutes <= 0 {
            return Err("Access token lifetime must be positive".into());
        }

        if self.jwt.refresh_token_expires_days <= 0 {
            return Err("Refresh token lifetime must be positive".into());
        }

        if self.otp.lifetime_minutes <= 0 {
            return Err("OTP lifetime must be positive".into());
        }

        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".into());
        }

        Ok(())
    }
}
