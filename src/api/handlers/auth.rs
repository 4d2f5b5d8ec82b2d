use crate::api::error::AppError;
use crate::api::middleware::auth::validate_bearer;
use axum::{Json, extract::State, http::HeaderMap};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub message: String,
}

/// Lets a client check its token without touching any file
#[utoipa::path(
    post,
    path = "/api/verify-token",
    responses(
        (status = 200, description = "Token accepted", body = TokenResponse),
        (status = 401, description = "Missing, malformed or wrong token", body = crate::api::handlers::files::ErrorResponse)
    ),
    security(
        ("bearer" = [])
    ),
    tag = "auth"
)]
pub async fn verify_token(
    State(state): State<crate::AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    validate_bearer(&headers, &state.config.api_token)?;

    Ok(Json(TokenResponse {
        message: "Token is valid".to_string(),
    }))
}
