//! OTP-gated payments.
//!
//! A payment record is only persisted after its owner proves control of the
//! email address given at checkout: the draft is parked in the ephemeral
//! verification store alongside a 6-digit code, and committed exactly once
//! when the code comes back.

mod flow;
mod types;

pub use flow::PaymentOtpFlow;
pub use types::{PaymentDraft, PaymentRecord, PaymentStatus};
