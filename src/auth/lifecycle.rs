//! Account-level two-factor lifecycle.
//!
//! Disabled → PendingSetup → Enabled → Disabled, plus the login-time
//! challenge. Every state-changing transition except the initial secret
//! generation requires a valid current code, so a stolen session token
//! alone cannot disable 2FA. Disable uses the same verifier and code format
//! as enable; there is no second code path.

use crate::auth::backup::BackupCodeGenerator;
use crate::auth::totp::TotpManager;
use crate::error::{PawgateError, Result};
use crate::storage::{User, UserStore};
use serde::Serialize;
use std::sync::Arc;

/// Where an account stands in the two-factor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TwoFactorStatus {
    /// No secret stored.
    Disabled,
    /// Secret generated but setup code not yet verified.
    PendingSetup,
    /// Setup verified; login requires a code.
    Enabled,
}

/// Status probe payload for the account page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorStatusReport {
    pub status: TwoFactorStatus,
    pub backup_codes_remaining: usize,
}

/// What the client receives after generating a 2FA enrolment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetup {
    /// Base32 secret, for manual entry into an authenticator app.
    pub secret: String,
    /// QR code as a PNG data URI.
    pub qr_code: String,
    /// Backup codes, displayed this one time.
    pub backup_codes: Vec<String>,
}

/// Orchestrates the two-factor lifecycle over a [`UserStore`].
pub struct TwoFactorFlow {
    users: Arc<dyn UserStore>,
    totp: TotpManager,
    backup: BackupCodeGenerator,
}

impl TwoFactorFlow {
    pub fn new(users: Arc<dyn UserStore>, totp: TotpManager) -> Self {
        Self {
            users,
            totp,
            backup: BackupCodeGenerator::new(),
        }
    }

    /// Disabled → PendingSetup: create and store a secret plus backup codes.
    ///
    /// Re-generating always restarts enrolment: the previous secret and
    /// codes are replaced and the enabled flag drops until the new secret
    /// is verified.
    pub async fn generate(&self, user_id: &str) -> Result<TwoFactorSetup> {
        let user = self.require_user(user_id).await?;

        let setup = self.totp.generate_setup(&user.email)?;
        let codes = self.backup.generate();

        self.users
            .store_two_factor_secret(&user.id, &setup.secret, &codes.codes)
            .await?;

        tracing::info!(user_id = %user.id, "2FA enrolment generated");

        Ok(TwoFactorSetup {
            secret: setup.secret,
            qr_code: setup.qr_code,
            backup_codes: codes.display_codes(),
        })
    }

    /// PendingSetup → Enabled: verify the first code from the authenticator.
    ///
    /// An invalid code leaves the account exactly as it was; the enabled
    /// flag never flips on a failed check.
    pub async fn verify_setup(&self, user_id: &str, code: &str) -> Result<()> {
        let user = self.require_user(user_id).await?;

        if !self.verify_totp(&user, code)? {
            return Err(PawgateError::InvalidCode);
        }

        self.users.enable_two_factor(&user.id).await?;
        tracing::info!(user_id = %user.id, "2FA enabled");
        Ok(())
    }

    /// Resolve the login challenge: a code is required before the caller
    /// grants a session.
    ///
    /// Accepts the current TOTP code, or one of the account's backup codes,
    /// which is removed on first use.
    pub async fn verify_login(&self, email: &str, code: &str) -> Result<User> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(PawgateError::UserNotFound)?;

        if !user.two_factor_enabled {
            return Err(PawgateError::NotEnabled);
        }

        let code = code.trim();

        // TOTP first (6 digits), then backup codes
        if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
            if self.verify_totp(&user, code)? {
                return Ok(user);
            }
        }

        if let Some(index) = BackupCodeGenerator::verify(code, &user.two_factor_backup_codes) {
            self.users.remove_backup_code(&user.id, index).await?;
            tracing::info!(user_id = %user.id, "Backup code used for login");
            return Ok(user);
        }

        Err(PawgateError::InvalidCode)
    }

    /// Enabled → Disabled: requires proof of possession of a current code.
    ///
    /// Clears the secret, backup codes, and both flags.
    pub async fn disable(&self, user_id: &str, code: &str) -> Result<()> {
        let user = self.require_user(user_id).await?;

        if !self.verify_totp(&user, code)? {
            return Err(PawgateError::InvalidCode);
        }

        self.users.clear_two_factor(&user.id).await?;
        tracing::info!(user_id = %user.id, "2FA disabled");
        Ok(())
    }

    /// Report lifecycle state and remaining backup codes.
    pub async fn status(&self, user_id: &str) -> Result<TwoFactorStatusReport> {
        let user = self.require_user(user_id).await?;

        let status = if user.two_factor_enabled {
            TwoFactorStatus::Enabled
        } else if user.two_factor_secret.is_some() {
            TwoFactorStatus::PendingSetup
        } else {
            TwoFactorStatus::Disabled
        };

        Ok(TwoFactorStatusReport {
            status,
            backup_codes_remaining: user.two_factor_backup_codes.len(),
        })
    }

    async fn require_user(&self, user_id: &str) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(PawgateError::UserNotFound)
    }

    /// A missing secret verifies false, same as a wrong code.
    fn verify_totp(&self, user: &User, code: &str) -> Result<bool> {
        let secret = user.two_factor_secret.as_deref().unwrap_or("");
        self.totp.verify(secret, code, &user.email)
    }

    /// The TOTP manager, for enrolment tooling and tests.
    pub fn totp(&self) -> &TotpManager {
        &self.totp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::totp::TotpConfig;
    use crate::storage::InMemoryUserStore;

    fn flow() -> (TwoFactorFlow, Arc<InMemoryUserStore>) {
        let users = Arc::new(InMemoryUserStore::new());
        users.insert(User::new("u1", "Dana", "dana@clinic.example"));
        let flow = TwoFactorFlow::new(users.clone(), TotpManager::new(TotpConfig::default()));
        (flow, users)
    }

    #[tokio::test]
    async fn test_generate_enters_pending_setup() {
        let (flow, users) = flow();

        let setup = flow.generate("u1").await.unwrap();
        assert!(!setup.secret.is_empty());
        assert!(setup.qr_code.starts_with("data:image/png;base64,"));
        assert_eq!(setup.backup_codes.len(), 8);

        let user = users.find_by_id("u1").await.unwrap().unwrap();
        assert!(!user.two_factor_enabled);
        assert!(user.two_factor_secret.is_some());

        let report = flow.status("u1").await.unwrap();
        assert_eq!(report.status, TwoFactorStatus::PendingSetup);
        assert_eq!(report.backup_codes_remaining, 8);
    }

    #[tokio::test]
    async fn test_generate_unknown_user() {
        let (flow, _users) = flow();
        let err = flow.generate("ghost").await.unwrap_err();
        assert!(matches!(err, PawgateError::UserNotFound));
    }

    #[tokio::test]
    async fn test_verify_setup_with_valid_code_enables() {
        let (flow, users) = flow();

        let setup = flow.generate("u1").await.unwrap();
        let code = flow.totp().current_code(&setup.secret, "dana@clinic.example").unwrap();

        flow.verify_setup("u1", &code).await.unwrap();

        let user = users.find_by_id("u1").await.unwrap().unwrap();
        assert!(user.two_factor_enabled);
        assert!(user.two_factor_verified);
    }

    #[tokio::test]
    async fn test_verify_setup_with_invalid_code_never_enables() {
        let (flow, users) = flow();

        flow.generate("u1").await.unwrap();
        let err = flow.verify_setup("u1", "000000").await.unwrap_err();
        assert!(matches!(err, PawgateError::InvalidCode));

        // Secret stays stored but the account is not enabled
        let user = users.find_by_id("u1").await.unwrap().unwrap();
        assert!(!user.two_factor_enabled);
        assert!(user.two_factor_secret.is_some());
    }

    #[tokio::test]
    async fn test_verify_setup_before_generate_is_invalid_code() {
        let (flow, _users) = flow();
        let err = flow.verify_setup("u1", "123456").await.unwrap_err();
        assert!(matches!(err, PawgateError::InvalidCode));
    }

    #[tokio::test]
    async fn test_login_challenge_requires_enabled() {
        let (flow, _users) = flow();

        flow.generate("u1").await.unwrap();
        let err = flow
            .verify_login("dana@clinic.example", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, PawgateError::NotEnabled));
    }

    #[tokio::test]
    async fn test_login_with_totp_code() {
        let (flow, _users) = flow();

        let setup = flow.generate("u1").await.unwrap();
        let code = flow.totp().current_code(&setup.secret, "dana@clinic.example").unwrap();
        flow.verify_setup("u1", &code).await.unwrap();

        let user = flow
            .verify_login("dana@clinic.example", &code)
            .await
            .unwrap();
        assert_eq!(user.id, "u1");

        let err = flow
            .verify_login("dana@clinic.example", "000000")
            .await
            .unwrap_err();
        assert!(matches!(err, PawgateError::InvalidCode));
    }

    #[tokio::test]
    async fn test_login_with_backup_code_is_single_use() {
        let (flow, users) = flow();

        let setup = flow.generate("u1").await.unwrap();
        let code = flow.totp().current_code(&setup.secret, "dana@clinic.example").unwrap();
        flow.verify_setup("u1", &code).await.unwrap();

        let backup = setup.backup_codes[0].clone();
        flow.verify_login("dana@clinic.example", &backup)
            .await
            .unwrap();

        let user = users.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(user.two_factor_backup_codes.len(), 7);

        // Same code a second time fails
        let err = flow
            .verify_login("dana@clinic.example", &backup)
            .await
            .unwrap_err();
        assert!(matches!(err, PawgateError::InvalidCode));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let (flow, _users) = flow();
        let err = flow
            .verify_login("ghost@clinic.example", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, PawgateError::UserNotFound));
    }

    #[tokio::test]
    async fn test_disable_requires_valid_code() {
        let (flow, users) = flow();

        let setup = flow.generate("u1").await.unwrap();
        let code = flow.totp().current_code(&setup.secret, "dana@clinic.example").unwrap();
        flow.verify_setup("u1", &code).await.unwrap();

        // Wrong code: state untouched
        let err = flow.disable("u1", "000000").await.unwrap_err();
        assert!(matches!(err, PawgateError::InvalidCode));
        let user = users.find_by_id("u1").await.unwrap().unwrap();
        assert!(user.two_factor_enabled);
        assert!(user.two_factor_secret.is_some());
        assert_eq!(user.two_factor_backup_codes.len(), 8);

        // Valid code: everything cleared
        flow.disable("u1", &code).await.unwrap();
        let user = users.find_by_id("u1").await.unwrap().unwrap();
        assert!(!user.two_factor_enabled);
        assert!(!user.two_factor_verified);
        assert!(user.two_factor_secret.is_none());
        assert!(user.two_factor_backup_codes.is_empty());

        let report = flow.status("u1").await.unwrap();
        assert_eq!(report.status, TwoFactorStatus::Disabled);
    }

    #[tokio::test]
    async fn test_regenerate_restarts_enrolment() {
        let (flow, users) = flow();

        let first = flow.generate("u1").await.unwrap();
        let code = flow.totp().current_code(&first.secret, "dana@clinic.example").unwrap();
        flow.verify_setup("u1", &code).await.unwrap();

        let second = flow.generate("u1").await.unwrap();
        assert_ne!(first.secret, second.secret);

        let user = users.find_by_id("u1").await.unwrap().unwrap();
        assert!(!user.two_factor_enabled);
        assert_eq!(user.two_factor_secret.as_deref(), Some(second.secret.as_str()));
    }
}
