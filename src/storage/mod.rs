//! Storage traits and models.
//!
//! The platform's durable database sits behind these traits; the in-memory
//! implementations in [`memory`] back tests and single-process deployments.

pub mod memory;

pub use memory::{InMemoryPaymentStore, InMemoryUserStore};

use crate::error::Result;
use crate::payments::{PaymentRecord, PaymentStatus};
use async_trait::async_trait;
use serde::Serialize;

/// A platform account, reduced to the fields the verification core touches.
///
/// Invariant: `two_factor_secret` is non-empty whenever `two_factor_enabled`
/// is true. The secret is created at setup-generation and cleared on
/// disable; `two_factor_enabled` flips only after a successful TOTP check.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Base32 TOTP secret, present while enabled or mid-setup.
    pub two_factor_secret: Option<String>,
    pub two_factor_enabled: bool,
    /// Set true on successful setup-verification.
    pub two_factor_verified: bool,
    /// Remaining single-use recovery codes.
    pub two_factor_backup_codes: Vec<String>,
}

impl User {
    /// Create an account with two-factor disabled.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            two_factor_secret: None,
            two_factor_enabled: false,
            two_factor_verified: false,
            two_factor_backup_codes: Vec::new(),
        }
    }

    /// Public view of the account, without secret material.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            two_factor_enabled: self.two_factor_enabled,
        }
    }
}

/// What the API returns about a user. Never carries the TOTP secret or
/// backup codes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub two_factor_enabled: bool,
}

/// User storage operations required by the two-factor lifecycle.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Find a user by email address (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Store a fresh secret and backup-code batch, entering pending setup.
    ///
    /// Resets `two_factor_enabled` and `two_factor_verified`: re-generating
    /// always restarts enrolment from scratch.
    async fn store_two_factor_secret(
        &self,
        user_id: &str,
        secret: &str,
        backup_codes: &[String],
    ) -> Result<()>;

    /// Flip the account to enabled after a verified setup code.
    async fn enable_two_factor(&self, user_id: &str) -> Result<()>;

    /// Clear secret, backup codes, and flags.
    async fn clear_two_factor(&self, user_id: &str) -> Result<()>;

    /// Remove a used backup code by index.
    async fn remove_backup_code(&self, user_id: &str, index: usize) -> Result<()>;
}

/// Payment record persistence.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persist a committed payment record.
    async fn create(&self, record: PaymentRecord) -> Result<PaymentRecord>;

    async fn find_by_id(&self, id: &str) -> Result<Option<PaymentRecord>>;

    async fn list(&self) -> Result<Vec<PaymentRecord>>;

    async fn set_status(&self, id: &str, status: PaymentStatus) -> Result<()>;
}
