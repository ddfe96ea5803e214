//! Pawgate - authentication and payment-verification core for a pet-care platform
//!
//! Pawgate provides the security-sensitive subsystem of the platform: TOTP-based
//! two-factor authentication for user accounts, and an OTP-gated payment workflow
//! in which a payment record is committed only after the payer proves control of
//! the email address given at checkout.
//!
//! # Features
//!
//! - **Two-factor auth**: TOTP setup with QR provisioning, login challenge,
//!   code-gated disable, single-use backup codes
//! - **OTP-gated payments**: emailed 6-digit codes with a 5-minute window,
//!   consume-on-first-attempt verification, at-most-one commit per code
//! - **Email**: SMTP via lettre, console mailer for development, per-call-site
//!   retry policies with exponential backoff
//! - **HTTP**: Axum-based JSON API under `/api`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pawgate::{AppContext, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     pawgate::init_tracing();
//!
//!     let config = Config::builder().from_env().build().unwrap();
//!     let ctx = AppContext::builder().build();
//!
//!     pawgate::serve(config, ctx).await.unwrap();
//! }
//! ```

mod app;
pub mod auth;
mod config;
pub mod email;
mod error;
pub mod http;
pub mod payments;
pub mod storage;
mod utils;
pub mod verification;

// Re-exports for public API
pub use app::{serve, AppContext, AppContextBuilder};
pub use auth::lifecycle::{TwoFactorFlow, TwoFactorSetup, TwoFactorStatus, TwoFactorStatusReport};
pub use auth::{BackupCodeGenerator, BackupCodes, TotpConfig, TotpManager, TotpSetup};
pub use config::{Config, ConfigBuilder, LoggingConfig, ServerConfig};
pub use email::{
    ConsoleMailer, DeliveryResult, Email, EmailDelivery, Mailer, RetryPolicy, SmtpConfig,
    SmtpMailer,
};
pub use error::{PawgateError, Result};
pub use http::ApiResponse;
pub use payments::{PaymentDraft, PaymentOtpFlow, PaymentRecord, PaymentStatus};
pub use storage::{
    InMemoryPaymentStore, InMemoryUserStore, PaymentStore, User, UserProfile, UserStore,
};
pub use verification::{Clock, ManualClock, OtpLookupError, OtpStore, PendingOtp, SystemClock, OTP_TTL};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging with sensible defaults.
///
/// Call this early in `main()`, before building the application context.
///
/// # Environment Variables
///
/// - `RUST_LOG`: log level filter (e.g., "info", "debug", "pawgate=debug")
/// - `PAWGATE_LOG_JSON`: set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("PAWGATE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing from an explicit configuration.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
