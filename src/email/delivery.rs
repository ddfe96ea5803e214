//! Delivery wrapper with per-call retry policies.
//!
//! The platform's two email call sites use different policies: refund
//! notifications retry transient failures with exponential backoff, while
//! payment-OTP sends go out exactly once and report failure to the caller
//! immediately (the pending OTP survives, so the user can re-request).
//! Both policies live here as values so each call site states its own.

use crate::email::{Email, Mailer};
use std::sync::Arc;
use std::time::Duration;

/// How many attempts a send gets and how long to wait between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Delay multiplier per subsequent attempt.
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Send once, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Exponential backoff: `base_delay`, then ×`multiplier` per attempt.
    pub fn backoff(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier,
        }
    }

    /// The standard notification policy: 3 attempts, 1000 ms base, ×2.
    pub fn notification() -> Self {
        Self::backoff(3, Duration::from_millis(1000), 2)
    }

    /// Delay before the attempt after `completed` failed attempts.
    fn delay_after(&self, completed: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(completed.saturating_sub(1))
    }
}

/// Outcome of a delivery, reported as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered { attempts: u32 },
    Failed { attempts: u32 },
}

impl DeliveryResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryResult::Delivered { .. })
    }
}

/// Sends one-time messages through a [`Mailer`] under a [`RetryPolicy`].
///
/// Never returns an error: after retries are exhausted the failure is
/// logged with full message context and reported as
/// [`DeliveryResult::Failed`]. The orchestrating flow decides whether that
/// surfaces to the user.
#[derive(Clone)]
pub struct EmailDelivery {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl EmailDelivery {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }

    /// Send a plain text message to `to` under the given policy.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        policy: &RetryPolicy,
    ) -> DeliveryResult {
        let email = Email::new(&self.from, to, subject).text(body);
        self.deliver(&email, policy).await
    }

    /// Send an already-built message under the given policy.
    pub async fn deliver(&self, email: &Email, policy: &RetryPolicy) -> DeliveryResult {
        let mut attempt = 1u32;

        loop {
            match self.mailer.send(email).await {
                Ok(()) => {
                    tracing::debug!(
                        to = %email.to,
                        subject = %email.subject,
                        attempt,
                        "Email delivered"
                    );
                    return DeliveryResult::Delivered { attempts: attempt };
                }
                Err(e) if attempt < policy.max_attempts => {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(
                        to = %email.to,
                        subject = %email.subject,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Email delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        to = %email.to,
                        subject = %email.subject,
                        body = ?email.text,
                        attempts = attempt,
                        error = %e,
                        "Email delivery failed, giving up"
                    );
                    return DeliveryResult::Failed { attempts: attempt };
                }
            }
        }
    }
}
