//! Payment data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payment as submitted at checkout, before OTP verification.
///
/// Drafts live only in the ephemeral verification store; nothing is
/// persisted until the OTP is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    /// Name of the pet owner paying.
    pub owner_name: String,
    /// Checkout email; the OTP goes here and the record is keyed by it.
    pub email: String,
    /// What is being paid for (e.g., "Annual vaccination package").
    pub description: String,
    /// Amount in the smallest currency unit.
    pub amount_cents: i64,
}

/// Lifecycle of a committed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Refunded,
}

/// A committed payment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub owner_name: String,
    pub email: String,
    pub description: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Build the committed record for a verified draft.
    pub fn commit(draft: PaymentDraft) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_name: draft.owner_name,
            email: draft.email,
            description: draft.description,
            amount_cents: draft.amount_cents,
            status: PaymentStatus::Paid,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_assigns_id_and_paid_status() {
        let draft = PaymentDraft {
            owner_name: "Dana".into(),
            email: "dana@clinic.example".into(),
            description: "Flea treatment".into(),
            amount_cents: 4_200,
        };
        let record = PaymentRecord::commit(draft.clone());

        assert!(!record.id.is_empty());
        assert_eq!(record.status, PaymentStatus::Paid);
        assert_eq!(record.email, draft.email);
        assert_eq!(record.amount_cents, 4_200);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let draft = PaymentDraft {
            owner_name: "Dana".into(),
            email: "dana@clinic.example".into(),
            description: "Flea treatment".into(),
            amount_cents: 4_200,
        };
        let json = serde_json::to_value(PaymentRecord::commit(draft)).unwrap();

        assert!(json.get("ownerName").is_some());
        assert!(json.get("amountCents").is_some());
        assert_eq!(json["status"], "paid");
    }
}
