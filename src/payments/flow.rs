//! The OTP-gated payment flow.

use crate::auth::otp::generate_numeric_otp;
use crate::email::{EmailDelivery, RetryPolicy};
use crate::error::{PawgateError, Result};
use crate::payments::{PaymentDraft, PaymentRecord, PaymentStatus};
use crate::storage::PaymentStore;
use crate::verification::{OtpLookupError, OtpStore};
use std::sync::Arc;

/// Orchestrates create-payment → send-OTP → verify-OTP → commit-payment.
///
/// The pending draft is keyed by the normalized checkout email, so a repeat
/// checkout for the same address invalidates the earlier code. Verification
/// consumes the pending entry before comparing codes: one wrong guess burns
/// the OTP and the buyer starts over.
pub struct PaymentOtpFlow {
    payments: Arc<dyn PaymentStore>,
    pending: OtpStore<PaymentDraft>,
    delivery: EmailDelivery,
    /// OTP sends go out once; a failure surfaces immediately.
    otp_policy: RetryPolicy,
    /// Refund notifications retry transient failures.
    refund_policy: RetryPolicy,
}

impl PaymentOtpFlow {
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        pending: OtpStore<PaymentDraft>,
        delivery: EmailDelivery,
    ) -> Self {
        Self {
            payments,
            pending,
            delivery,
            otp_policy: RetryPolicy::none(),
            refund_policy: RetryPolicy::notification(),
        }
    }

    /// Step 1-2: park the draft and email its OTP.
    ///
    /// The pending entry is created before the send, so a delivery failure
    /// leaves the draft parked; the buyer can retry checkout, which
    /// overwrites the entry with a fresh code. Returns the address the code
    /// went to.
    pub async fn request_payment(&self, draft: PaymentDraft) -> Result<String> {
        let email = draft.email.trim().to_lowercase();
        let code = generate_numeric_otp();

        let mut draft = draft;
        draft.email = email.clone();
        self.pending.put(&email, &code, draft);

        tracing::info!(email = %email, "Payment OTP issued");

        let body = format!(
            "Your payment verification code is {}.\n\n\
             It expires in 5 minutes. If you did not start a checkout at the \
             clinic, you can ignore this message.",
            code
        );
        let result = self
            .delivery
            .send(&email, "Your payment verification code", &body, &self.otp_policy)
            .await;

        if !result.is_delivered() {
            return Err(PawgateError::email_delivery(format!(
                "could not send OTP to {}",
                email
            )));
        }

        Ok(email)
    }

    /// Step 3-4: consume the pending entry, compare codes, commit.
    ///
    /// The entry is deleted on this first attempt whatever the outcome, so
    /// at most one payment can ever be created per issued code.
    pub async fn verify_otp(&self, email: &str, submitted: &str) -> Result<PaymentRecord> {
        let email = email.trim().to_lowercase();

        let entry = self.pending.consume(&email).map_err(|e| match e {
            OtpLookupError::NotFound => PawgateError::OtpNotFound,
            OtpLookupError::Expired => PawgateError::OtpExpired,
        })?;

        if entry.code != submitted.trim() {
            tracing::info!(email = %email, "Payment OTP mismatch; pending draft discarded");
            return Err(PawgateError::InvalidOtp);
        }

        let record = self.payments.create(PaymentRecord::commit(entry.payload)).await?;
        tracing::info!(email = %email, payment_id = %record.id, "Payment committed");
        Ok(record)
    }

    /// Refund a committed payment and notify the payer.
    ///
    /// The notification retries with backoff; if it still fails the refund
    /// stands and the failure is only logged.
    pub async fn refund(&self, payment_id: &str) -> Result<PaymentRecord> {
        let record = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or(PawgateError::PaymentNotFound)?;

        if record.status == PaymentStatus::Refunded {
            return Err(PawgateError::bad_request("Payment is already refunded"));
        }

        self.payments
            .set_status(payment_id, PaymentStatus::Refunded)
            .await?;
        tracing::info!(payment_id = %payment_id, "Payment refunded");

        let body = format!(
            "Your payment of {} for \"{}\" has been refunded.\n\n\
             The amount will be returned to your original payment method.",
            format_amount(record.amount_cents),
            record.description
        );
        let result = self
            .delivery
            .send(&record.email, "Your refund is on its way", &body, &self.refund_policy)
            .await;
        if !result.is_delivered() {
            tracing::warn!(
                payment_id = %payment_id,
                email = %record.email,
                "Refund processed but notification could not be delivered"
            );
        }

        let mut record = record;
        record.status = PaymentStatus::Refunded;
        Ok(record)
    }

    /// Committed payment records, oldest first.
    pub async fn list(&self) -> Result<Vec<PaymentRecord>> {
        self.payments.list().await
    }
}

fn format_amount(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}
