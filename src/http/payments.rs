//! Payment endpoints.

use crate::app::AppContext;
use crate::error::Result;
use crate::http::{ApiResponse, ValidatedJson};
use crate::payments::{PaymentDraft, PaymentRecord};
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Routes mounted under `/api/payments`.
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/payments", post(create).get(list))
        .route("/payments/verify-otp", post(verify_otp))
        .route("/payments/{id}/refund", post(refund))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentRequest {
    #[validate(length(min = 1, message = "is required"))]
    owner_name: String,
    #[validate(email(message = "must be a valid email address"))]
    email: String,
    #[validate(length(min = 1, message = "is required"))]
    description: String,
    #[validate(range(min = 1, message = "must be positive"))]
    amount_cents: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpRequest {
    #[validate(email(message = "must be a valid email address"))]
    email: String,
    #[validate(length(equal = 6, message = "must be 6 digits"))]
    otp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OtpIssued {
    email: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentCommitted {
    payment: PaymentRecord,
}

async fn create(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<CreatePaymentRequest>,
) -> Result<ApiResponse<OtpIssued>> {
    let draft = PaymentDraft {
        owner_name: req.owner_name,
        email: req.email,
        description: req.description,
        amount_cents: req.amount_cents,
    };

    let email = ctx.payments.request_payment(draft).await?;
    Ok(ApiResponse::with_message(
        OtpIssued { email },
        "OTP sent successfully",
    ))
}

async fn verify_otp(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<ApiResponse<PaymentCommitted>> {
    let payment = ctx.payments.verify_otp(&req.email, &req.otp).await?;
    Ok(ApiResponse::with_message(
        PaymentCommitted { payment },
        "Payment verified and recorded",
    ))
}

async fn refund(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<ApiResponse<PaymentCommitted>> {
    let payment = ctx.payments.refund(&id).await?;
    Ok(ApiResponse::with_message(
        PaymentCommitted { payment },
        "Payment refunded",
    ))
}

async fn list(State(ctx): State<AppContext>) -> Result<impl axum::response::IntoResponse> {
    let payments = ctx.payments.list().await?;
    Ok(Json(payments))
}
