/*
 * Responsibility
 * - POST /auth/login: throttle → credentials check → token issue
 * - POST /auth/verify: run a token through the AuthGate, return the current profile
 * - POST /auth/logout: stateless; the token stays valid until it expires
 */
use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    api::v1::{
        dto::{
            auth::{LoginRequest, LoginResponse, SessionResponse, VerifyRequest},
            users::{SettingsResponse, UserResponse},
        },
        extractors::{ClientAddr, CurrentUser, JsonBody},
    },
    error::AppError,
    repos::user_repo,
    services::{
        auth::{AuthRequest, principal::Principal},
        password,
    },
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "invalid username or password";

async fn record_failure(state: &AppState, client: &str) {
    match state.throttle.record_failure(client).await {
        Ok(attempts) => warn!(client = %client, attempts, "login attempt failed"),
        Err(err) => error!(client = %client, error = %err, "login throttle unavailable"),
    }
}

pub(crate) async fn load_settings(
    state: &AppState,
    user_id: i64,
) -> Result<SettingsResponse, AppError> {
    let row = user_repo::settings(&state.db, user_id).await?;
    Ok(row.map(SettingsResponse::from).unwrap_or_default())
}

pub async fn login(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // Throttle backend outages fail open: login still works, the event is logged.
    match state.throttle.is_blocked(&client).await {
        Ok(true) => {
            warn!(client = %client, "login blocked by throttle");
            return Err(AppError::TooManyRequests);
        }
        Ok(false) => {}
        Err(err) => error!(client = %client, error = %err, "login throttle unavailable"),
    }

    info!(username = %req.username(), "login attempt");

    if let Err(msg) = req.validate() {
        record_failure(&state, &client).await;
        return Err(AppError::validation(msg));
    }

    let Some(creds) = user_repo::find_credentials(&state.db, req.username()).await? else {
        warn!(username = %req.username(), "login failed: unknown or inactive user");
        record_failure(&state, &client).await;
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    let matches = password::verify_blocking(req.password, creds.password_hash).await?;
    if !matches {
        warn!(user_id = creds.user.id, "login failed: wrong password");
        record_failure(&state, &client).await;
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let mut principal = Principal::from(creds.user);
    principal.last_login = user_repo::touch_last_login(&state.db, principal.id).await?;

    if let Err(err) = state.throttle.reset(&client).await {
        error!(client = %client, error = %err, "failed to reset login throttle");
    }

    let codec = state.auth.codec();
    let token = codec
        .issue(principal.id, &principal.username, &principal.role)
        .map_err(|err| {
            error!(error = %err, "token issue failed");
            AppError::Internal
        })?;

    let settings = load_settings(&state, principal.id).await?;

    info!(user_id = principal.id, username = %principal.username, "user logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: codec.ttl_seconds(),
        user: principal.into(),
        settings,
    }))
}

pub async fn verify(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let token = req
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::validation("token is required"))?;

    let body = json!({ "token": token });
    let principal = state
        .auth
        .authenticate(&AuthRequest::new(&Method::POST).with_body(&body))
        .await?;

    let settings = load_settings(&state, principal.id).await?;

    Ok(Json(SessionResponse {
        user: UserResponse::from(principal),
        settings,
    }))
}

pub async fn logout(CurrentUser(user): CurrentUser) -> StatusCode {
    info!(user_id = user.id, username = %user.username, "user logged out");
    StatusCode::NO_CONTENT
}
