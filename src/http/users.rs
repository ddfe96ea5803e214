//! Two-factor authentication endpoints.

use crate::app::AppContext;
use crate::error::Result;
use crate::http::{ApiResponse, ValidatedJson};
use crate::storage::UserProfile;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Routes mounted under `/api/users`.
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/users/generate-2fa", post(generate))
        .route("/users/verify-2fa-setup", post(verify_setup))
        .route("/users/verify-2fa-login", post(verify_login))
        .route("/users/disable-2fa", post(disable))
        .route("/users/{id}/2fa-status", get(status))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[validate(length(min = 1, message = "is required"))]
    user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct VerifySetupRequest {
    #[validate(length(min = 1, message = "is required"))]
    user_id: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct VerifyLoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    email: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct DisableRequest {
    #[validate(length(min = 1, message = "is required"))]
    user_id: String,
    #[validate(length(min = 6, message = "must be at least 6 characters"))]
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginVerified {
    user: UserProfile,
}

async fn generate(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<GenerateRequest>,
) -> Result<impl axum::response::IntoResponse> {
    let setup = ctx.two_factor.generate(&req.user_id).await?;
    Ok(Json(setup))
}

async fn verify_setup(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<VerifySetupRequest>,
) -> Result<ApiResponse<()>> {
    ctx.two_factor.verify_setup(&req.user_id, &req.token).await?;
    Ok(ApiResponse::message("2FA enabled successfully"))
}

async fn verify_login(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<VerifyLoginRequest>,
) -> Result<ApiResponse<LoginVerified>> {
    let user = ctx.two_factor.verify_login(&req.email, &req.token).await?;
    Ok(ApiResponse::with_message(
        LoginVerified {
            user: user.profile(),
        },
        "2FA verification successful",
    ))
}

async fn disable(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<DisableRequest>,
) -> Result<ApiResponse<()>> {
    ctx.two_factor.disable(&req.user_id, &req.token).await?;
    Ok(ApiResponse::message("2FA disabled successfully"))
}

async fn status(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl axum::response::IntoResponse> {
    let report = ctx.two_factor.status(&id).await?;
    Ok(Json(report))
}
