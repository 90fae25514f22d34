/*
 * Responsibility
 * - /users/me profile, password and settings (caller = CurrentUser)
 * - POST /users admin-only account creation (RoleGate applied in routes)
 */
use axum::{Json, extract::State, http::StatusCode};
use tracing::info;

use crate::{
    api::v1::{
        dto::users::{
            ChangePasswordRequest, CreateUserRequest, SettingsResponse, UpdateProfileRequest,
            UpdateSettingsRequest, UserResponse,
        },
        extractors::{CurrentUser, JsonBody},
        handlers::auth::load_settings,
    },
    error::AppError,
    repos::{
        error::RepoError,
        user_repo::{self, NewUser, SettingsPatch},
    },
    services::{auth::principal::Principal, password},
    state::AppState,
};

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let row = user_repo::update_profile(
        &state.db,
        user.id,
        req.full_name.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
    )
    .await?
    .ok_or(AppError::not_found("user"))?;

    info!(user_id = user.id, "profile updated");

    Ok(Json(Principal::from(row).into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    req.validate().map_err(AppError::validation)?;

    let stored = user_repo::password_hash(&state.db, user.id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    if !password::verify_blocking(req.current_password, stored).await? {
        return Err(AppError::validation("current password is incorrect"));
    }

    let hash = password::hash_blocking(req.new_password).await?;
    if !user_repo::set_password_hash(&state.db, user.id, &hash).await? {
        return Err(AppError::not_found("user"));
    }

    info!(user_id = user.id, "password changed");

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SettingsResponse>, AppError> {
    Ok(Json(load_settings(&state, user.id).await?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let patch = SettingsPatch {
        theme: req.theme.as_deref().map(str::trim),
        auto_logout: req.auto_logout,
        caching_enabled: req.caching_enabled,
        notifications_enabled: req.notifications_enabled,
    };
    let row = user_repo::upsert_settings(&state.db, user.id, &patch).await?;

    info!(user_id = user.id, "settings updated");

    Ok(Json(row.into()))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let hash = password::hash_blocking(req.password.clone()).await?;
    let new = NewUser {
        username: req.username.trim(),
        password_hash: &hash,
        full_name: req.full_name.as_deref(),
        email: req.email.as_deref(),
        phone: req.phone.as_deref(),
        role: req.role(),
    };

    let row = user_repo::create(&state.db, &new).await.map_err(|e| match e {
        RepoError::Conflict => AppError::conflict("USERNAME_TAKEN", "username already exists"),
        other => other.into(),
    })?;

    info!(
        admin_id = admin.id,
        user_id = row.id,
        username = %row.username,
        role = %row.role,
        "user created"
    );

    Ok((StatusCode::CREATED, Json(Principal::from(row).into())))
}
