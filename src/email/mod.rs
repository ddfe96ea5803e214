//! Email sending.
//!
//! Two backends behind the [`Mailer`] trait:
//! - [`ConsoleMailer`] - prints emails to stdout (for development)
//! - [`SmtpMailer`] - sends via SMTP using lettre
//!
//! [`EmailDelivery`] sits on top of a mailer and applies a per-call
//! [`RetryPolicy`]; delivery failure is reported as a value, never as an
//! error that could fail the request that triggered the send.

mod console;
mod delivery;
mod smtp;

pub use console::ConsoleMailer;
pub use delivery::{DeliveryResult, EmailDelivery, RetryPolicy};
pub use smtp::{SmtpConfig, SmtpMailer};

use crate::error::{PawgateError, Result};
use async_trait::async_trait;

/// An email message to be sent.
#[derive(Debug, Clone)]
pub struct Email {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body (optional if html is provided).
    pub text: Option<String>,
    /// HTML body (optional if text is provided).
    pub html: Option<String>,
}

impl Email {
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            text: None,
            html: None,
        }
    }

    /// Set the plain text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Set the HTML body.
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Validate the email has required fields.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(PawgateError::bad_request("Email 'from' is required"));
        }
        if self.to.is_empty() {
            return Err(PawgateError::bad_request("Email 'to' is required"));
        }
        if self.subject.is_empty() {
            return Err(PawgateError::bad_request("Email 'subject' is required"));
        }
        if self.text.is_none() && self.html.is_none() {
            return Err(PawgateError::bad_request(
                "Email must have either 'text' or 'html' body",
            ));
        }
        Ok(())
    }
}

/// Mailer trait for sending emails.
///
/// Implement this to plug in another delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an email. Returns an error if the backend rejected or could not
    /// reach the message's destination.
    async fn send(&self, email: &Email) -> Result<()>;

    /// Check if the mailer backend is healthy/connected.
    fn is_healthy(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_builder() {
        let email = Email::new("from@test.com", "to@test.com", "Subject")
            .text("plain")
            .html("<p>rich</p>");

        assert_eq!(email.from, "from@test.com");
        assert_eq!(email.to, "to@test.com");
        assert_eq!(email.text.as_deref(), Some("plain"));
        assert_eq!(email.html.as_deref(), Some("<p>rich</p>"));
    }

    #[test]
    fn test_validation_requires_body() {
        let email = Email::new("from@test.com", "to@test.com", "Subject");
        assert!(email.validate().is_err());
    }

    #[test]
    fn test_validation_requires_recipient() {
        let email = Email::new("from@test.com", "", "Subject").text("body");
        assert!(email.validate().is_err());
    }

    #[test]
    fn test_validation_passes_with_text_only() {
        let email = Email::new("from@test.com", "to@test.com", "Subject").text("body");
        assert!(email.validate().is_ok());
    }
}
