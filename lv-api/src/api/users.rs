//! Account registration and login

use axum::{extract::State, http::StatusCode, Json};
use lv_common::auth::{hash_password, is_valid_email, verify_password};
use lv_common::db::users;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState};

/// E-mail and password, as posted to /register and /login
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let email = credentials.email.trim();
    if !is_valid_email(email) {
        return Err(ApiError::BadRequest(
            "Please enter a valid email address".to_string(),
        ));
    }
    if credentials.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let cost = state.config.auth.password_hash_cost;
    let password = credentials.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;

    let user = users::create_user(&state.db, email, &hash).await?;
    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration was successful".to_string(),
            token: state.issue_token(user.id),
            user_id: user.id,
        }),
    ))
}

/// POST /login
///
/// Unknown e-mail and wrong password get the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ApiResult<Json<LoginResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password!".to_string());

    let (user, stored) = users::find_credentials(&state.db, credentials.email.trim())
        .await?
        .ok_or_else(invalid)?;

    let password = credentials.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?;
    if !matches {
        warn!(user_id = %user.id, "Login with wrong password");
        return Err(invalid());
    }

    Ok(Json(LoginResponse {
        token: state.issue_token(user.id),
        user_id: user.id,
    }))
}
