/*
 * Responsibility
 * - SQLx operations on `users` and `user_settings`
 * - Takes a PgPool, returns rows; unique violations surface as RepoError::Conflict
 * - Inactive accounts are invisible to lookups used by authentication and login
 */
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;
use crate::services::auth::principal::Principal;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for Principal {
    fn from(row: UserRow) -> Self {
        Principal {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            role: row.role,
            is_active: row.is_active,
            created_at: row.created_at,
            last_login: row.last_login,
        }
    }
}

/// Login needs the hash; nothing else should select it.
#[derive(Debug, FromRow)]
pub struct CredentialsRow {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub password_hash: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct SettingsRow {
    pub theme: String,
    pub auto_logout: bool,
    pub caching_enabled: bool,
    pub notifications_enabled: bool,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub full_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub role: &'a str,
}

#[derive(Default)]
pub struct SettingsPatch<'a> {
    pub theme: Option<&'a str>,
    pub auto_logout: Option<bool>,
    pub caching_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
}

pub async fn find_active_by_id(db: &PgPool, id: i64) -> Result<Option<UserRow>, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, full_name, email, phone, role, is_active, created_at, last_login
        FROM users
        WHERE id = $1 AND is_active = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn find_credentials(
    db: &PgPool,
    username: &str,
) -> Result<Option<CredentialsRow>, RepoError> {
    let row = sqlx::query_as::<_, CredentialsRow>(
        r#"
        SELECT id, username, full_name, email, phone, role, is_active, created_at, last_login,
               password_hash
        FROM users
        WHERE username = $1 AND is_active = TRUE
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn touch_last_login(db: &PgPool, id: i64) -> Result<Option<DateTime<Utc>>, RepoError> {
    let at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        r#"
        UPDATE users
        SET last_login = now()
        WHERE id = $1
        RETURNING last_login
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .flatten();

    Ok(at)
}

pub async fn create(db: &PgPool, new: &NewUser<'_>) -> Result<UserRow, RepoError> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, password_hash, full_name, email, phone, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, username, full_name, email, phone, role, is_active, created_at, last_login
        "#,
    )
    .bind(new.username)
    .bind(new.password_hash)
    .bind(new.full_name)
    .bind(new.email)
    .bind(new.phone)
    .bind(new.role)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn update_profile(
    db: &PgPool,
    id: i64,
    full_name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<Option<UserRow>, RepoError> {
    // None -> keep the current value
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET
            full_name = COALESCE($2, full_name),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone)
        WHERE id = $1 AND is_active = TRUE
        RETURNING id, username, full_name, email, phone, role, is_active, created_at, last_login
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .bind(phone)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn password_hash(db: &PgPool, id: i64) -> Result<Option<String>, RepoError> {
    let hash = sqlx::query_scalar::<_, String>(
        r#"
        SELECT password_hash
        FROM users
        WHERE id = $1 AND is_active = TRUE
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(hash)
}

pub async fn set_password_hash(db: &PgPool, id: i64, hash: &str) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $2
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(hash)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn settings(db: &PgPool, user_id: i64) -> Result<Option<SettingsRow>, RepoError> {
    let row = sqlx::query_as::<_, SettingsRow>(
        r#"
        SELECT theme, auto_logout, caching_enabled, notifications_enabled
        FROM user_settings
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn upsert_settings(
    db: &PgPool,
    user_id: i64,
    patch: &SettingsPatch<'_>,
) -> Result<SettingsRow, RepoError> {
    // First write creates the row from defaults; later writes only touch provided fields.
    let row = sqlx::query_as::<_, SettingsRow>(
        r#"
        INSERT INTO user_settings (user_id, theme, auto_logout, caching_enabled, notifications_enabled)
        VALUES ($1, COALESCE($2, 'light'), COALESCE($3, TRUE), COALESCE($4, TRUE), COALESCE($5, TRUE))
        ON CONFLICT (user_id) DO UPDATE
        SET
            theme = COALESCE($2, user_settings.theme),
            auto_logout = COALESCE($3, user_settings.auto_logout),
            caching_enabled = COALESCE($4, user_settings.caching_enabled),
            notifications_enabled = COALESCE($5, user_settings.notifications_enabled),
            updated_at = now()
        RETURNING theme, auto_logout, caching_enabled, notifications_enabled
        "#,
    )
    .bind(user_id)
    .bind(patch.theme)
    .bind(patch.auto_logout)
    .bind(patch.caching_enabled)
    .bind(patch.notifications_enabled)
    .fetch_one(db)
    .await?;

    Ok(row)
}
