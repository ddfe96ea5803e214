//! TOTP (Time-based One-Time Password) support.

use crate::error::{PawgateError, Result};
use totp_rs::{Algorithm, Secret, TOTP};

/// Configuration for TOTP generation.
#[derive(Clone)]
pub struct TotpConfig {
    /// Issuer name shown in authenticator apps.
    pub issuer: String,
    /// Number of digits in the code (default: 6).
    pub digits: usize,
    /// Time step in seconds (default: 30).
    pub step: u64,
    /// Algorithm (default: SHA1 for authenticator-app compatibility).
    pub algorithm: Algorithm,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: "Pawgate".to_string(),
            digits: 6,
            step: 30,
            algorithm: Algorithm::SHA1,
        }
    }
}

impl TotpConfig {
    /// Create a new TOTP config with the given issuer name.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Default::default()
        }
    }
}

/// Data returned when setting up TOTP for a user.
pub struct TotpSetup {
    /// Base32-encoded secret to store on the user record.
    pub secret: String,
    /// Provisioning URI (otpauth://...).
    pub uri: String,
    /// QR code as a PNG data URI, ready for an `img src` attribute.
    pub qr_code: String,
}

/// Manages TOTP operations.
#[derive(Clone)]
pub struct TotpManager {
    config: TotpConfig,
}

impl TotpManager {
    pub fn new(config: TotpConfig) -> Self {
        Self { config }
    }

    /// Generate a new TOTP enrolment for an account.
    ///
    /// Returns the secret, the provisioning URI, and the QR code to scan.
    pub fn generate_setup(&self, account_name: &str) -> Result<TotpSetup> {
        let secret = Secret::generate_secret();
        let secret_base32 = secret.to_encoded().to_string();

        let totp = self.build_totp(&secret_base32, account_name)?;
        let uri = totp.get_url();

        let qr_png = totp
            .get_qr_base64()
            .map_err(|e| PawgateError::internal(format!("Failed to generate QR code: {}", e)))?;

        Ok(TotpSetup {
            secret: secret_base32,
            uri,
            qr_code: format!("data:image/png;base64,{}", qr_png),
        })
    }

    /// Verify a submitted code against a stored secret.
    ///
    /// Accepts codes from the current 30-second window plus one step either
    /// side to tolerate clock drift. An empty or absent secret never
    /// verifies; this covers accounts that have not completed setup, and
    /// deliberately reports the same way as a wrong code.
    pub fn verify(&self, secret: &str, code: &str, account_name: &str) -> Result<bool> {
        if secret.is_empty() {
            return Ok(false);
        }

        let totp = self.build_totp(secret, account_name)?;

        // Users paste codes with spaces or dashes
        let code = code.replace([' ', '-'], "");

        match totp.check_current(&code) {
            Ok(valid) => Ok(valid),
            Err(e) => {
                tracing::warn!(error = %e, "TOTP verification error (system time issue?)");
                Ok(false)
            }
        }
    }

    /// Verify against a specific unix timestamp.
    pub fn verify_at(&self, secret: &str, code: &str, account_name: &str, time: u64) -> Result<bool> {
        if secret.is_empty() {
            return Ok(false);
        }
        let totp = self.build_totp(secret, account_name)?;
        let code = code.replace([' ', '-'], "");
        Ok(totp.check(&code, time))
    }

    /// Compute the code for the current window.
    ///
    /// Exposed for enrolment verification tooling and tests.
    pub fn current_code(&self, secret: &str, account_name: &str) -> Result<String> {
        let totp = self.build_totp(secret, account_name)?;
        totp.generate_current()
            .map_err(|e| PawgateError::internal(format!("Failed to generate TOTP: {}", e)))
    }

    /// Compute the code for a specific unix timestamp.
    pub fn code_at(&self, secret: &str, account_name: &str, time: u64) -> Result<String> {
        let totp = self.build_totp(secret, account_name)?;
        Ok(totp.generate(time))
    }

    fn build_totp(&self, secret: &str, account_name: &str) -> Result<TOTP> {
        TOTP::new(
            self.config.algorithm,
            self.config.digits,
            1, // 1 step skew tolerance
            self.config.step,
            Secret::Encoded(secret.to_string())
                .to_bytes()
                .map_err(|e| PawgateError::internal(format!("Invalid TOTP secret: {}", e)))?,
            Some(self.config.issuer.clone()),
            account_name.to_string(),
        )
        .map_err(|e| PawgateError::internal(format!("Failed to create TOTP: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TotpManager {
        TotpManager::new(TotpConfig::default())
    }

    #[test]
    fn test_generate_and_verify_round_trip() {
        let manager = manager();
        let setup = manager.generate_setup("owner@clinic.example").unwrap();

        let code = manager
            .current_code(&setup.secret, "owner@clinic.example")
            .unwrap();
        assert!(manager
            .verify(&setup.secret, &code, "owner@clinic.example")
            .unwrap());
    }

    #[test]
    fn test_wrong_code_rejected() {
        let manager = manager();
        let setup = manager.generate_setup("owner@clinic.example").unwrap();

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let current = manager
            .code_at(&setup.secret, "owner@clinic.example", now)
            .unwrap();
        let wrong = if current == "000000" { "111111" } else { "000000" };
        assert!(!manager
            .verify_at(&setup.secret, wrong, "owner@clinic.example", now)
            .unwrap());
    }

    #[test]
    fn test_code_outside_window_rejected() {
        let manager = manager();
        let setup = manager.generate_setup("owner@clinic.example").unwrap();

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // One step away is inside the drift window
        let near = manager
            .code_at(&setup.secret, "owner@clinic.example", now - 30)
            .unwrap();
        assert!(manager
            .verify_at(&setup.secret, &near, "owner@clinic.example", now)
            .unwrap());

        // Two steps away is outside it
        let far = manager
            .code_at(&setup.secret, "owner@clinic.example", now - 90)
            .unwrap();
        assert!(!manager
            .verify_at(&setup.secret, &far, "owner@clinic.example", now)
            .unwrap());
    }

    #[test]
    fn test_empty_secret_never_verifies() {
        let manager = manager();
        assert!(!manager.verify("", "123456", "owner@clinic.example").unwrap());
    }

    #[test]
    fn test_code_with_spaces_accepted() {
        let manager = manager();
        let setup = manager.generate_setup("owner@clinic.example").unwrap();

        let code = manager
            .current_code(&setup.secret, "owner@clinic.example")
            .unwrap();
        let spaced = format!("{} {}", &code[..3], &code[3..]);
        assert!(manager
            .verify(&setup.secret, &spaced, "owner@clinic.example")
            .unwrap());
    }

    #[test]
    fn test_setup_contains_qr_data_uri() {
        let manager = manager();
        let setup = manager.generate_setup("owner@clinic.example").unwrap();

        assert!(!setup.secret.is_empty());
        assert!(setup.uri.starts_with("otpauth://totp/"));
        assert!(setup.qr_code.starts_with("data:image/png;base64,"));
    }
}
