//! Two-factor authentication.
//!
//! TOTP secrets and verification, single-use backup codes, the emailed
//! numeric OTP generator, and the account-level two-factor lifecycle.

pub mod backup;
pub mod lifecycle;
pub mod otp;
pub mod totp;

pub use backup::{BackupCodeGenerator, BackupCodes};
pub use lifecycle::{TwoFactorFlow, TwoFactorSetup, TwoFactorStatus, TwoFactorStatusReport};
pub use otp::generate_numeric_otp;
pub use totp::{TotpConfig, TotpManager, TotpSetup};
