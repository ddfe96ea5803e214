//! Application context and server assembly.

use crate::auth::totp::{TotpConfig, TotpManager};
use crate::auth::TwoFactorFlow;
use crate::config::Config;
use crate::email::{ConsoleMailer, EmailDelivery, Mailer, SmtpMailer};
use crate::error::Result;
use crate::http;
use crate::payments::PaymentOtpFlow;
use crate::storage::{InMemoryPaymentStore, InMemoryUserStore, PaymentStore, UserStore};
use crate::verification::{Clock, OtpStore, SystemClock};
use axum::Router;
use std::sync::Arc;

/// Shared state handed to every handler.
///
/// Holds the two orchestrating flows plus the user store (other platform
/// modules create accounts through it). Everything is behind `Arc`, so the
/// context clones cheaply per request.
#[derive(Clone)]
pub struct AppContext {
    pub two_factor: Arc<TwoFactorFlow>,
    pub payments: Arc<PaymentOtpFlow>,
    pub users: Arc<dyn UserStore>,
}

impl AppContext {
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::new()
    }

    /// The application router: all endpoints nested under `/api`.
    pub fn router(self) -> Router {
        let api = Router::new()
            .merge(http::users::routes())
            .merge(http::payments::routes());

        Router::new().nest("/api", api).with_state(self)
    }
}

/// Builder for [`AppContext`].
///
/// Defaults: in-memory stores, console mailer, wall clock. Production
/// deployments swap in the database-backed stores and the SMTP mailer.
#[must_use = "builder does nothing until you call build()"]
pub struct AppContextBuilder {
    users: Option<Arc<dyn UserStore>>,
    payments: Option<Arc<dyn PaymentStore>>,
    mailer: Option<Arc<dyn Mailer>>,
    clock: Arc<dyn Clock>,
    totp_config: TotpConfig,
    email_from: String,
}

impl AppContextBuilder {
    pub fn new() -> Self {
        Self {
            users: None,
            payments: None,
            mailer: None,
            clock: Arc::new(SystemClock),
            totp_config: TotpConfig::default(),
            email_from: "noreply@pawgate.dev".to_string(),
        }
    }

    pub fn with_user_store(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_payment_store(mut self, payments: Arc<dyn PaymentStore>) -> Self {
        self.payments = Some(payments);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_totp_config(mut self, config: TotpConfig) -> Self {
        self.totp_config = config;
        self
    }

    pub fn with_email_from(mut self, from: impl Into<String>) -> Self {
        self.email_from = from.into();
        self
    }

    /// Wire the mailer and sender address from configuration.
    ///
    /// Falls back to the console mailer when no SMTP host is configured.
    pub fn from_config(mut self, config: &Config) -> Result<Self> {
        self.email_from = config.email_from.clone();
        self.mailer = Some(match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp.clone())?),
            None => {
                tracing::warn!("No SMTP configuration; emails go to stdout");
                Arc::new(ConsoleMailer::new())
            }
        });
        Ok(self)
    }

    pub fn build(self) -> AppContext {
        let users = self
            .users
            .unwrap_or_else(|| Arc::new(InMemoryUserStore::new()));
        let payments = self
            .payments
            .unwrap_or_else(|| Arc::new(InMemoryPaymentStore::new()));
        let mailer = self.mailer.unwrap_or_else(|| Arc::new(ConsoleMailer::new()));

        let delivery = EmailDelivery::new(mailer, self.email_from);
        let totp = TotpManager::new(self.totp_config);

        AppContext {
            two_factor: Arc::new(TwoFactorFlow::new(users.clone(), totp)),
            payments: Arc::new(PaymentOtpFlow::new(
                payments,
                OtpStore::new(self.clock),
                delivery,
            )),
            users,
        }
    }
}

impl Default for AppContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: Config, ctx: AppContext) -> Result<()> {
    let addr = config
        .server
        .addr()
        .map_err(|e| crate::error::PawgateError::internal(format!("Invalid address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| crate::error::PawgateError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(%addr, "Pawgate listening");

    axum::serve(listener, ctx.router())
        .await
        .map_err(|e| crate::error::PawgateError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
