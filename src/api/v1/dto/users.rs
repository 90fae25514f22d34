/*
 * Responsibility
 * - Users / settings request and response DTOs
 * - validate() does format checks only; uniqueness etc. is the repo's job
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::user_repo::SettingsRow;
use crate::services::auth::principal::{Principal, ROLE_USER, is_known_role};
use crate::services::password;

pub const MIN_USERNAME_LEN: usize = 3;

/// `local@domain` with exactly one `@`, both sides non-empty, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// Optional leading `+`, then 10 to 15 ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Principal> for UserResponse {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id,
            username: p.username,
            full_name: p.full_name,
            email: p.email,
            phone: p.phone,
            role: p.role,
            created_at: p.created_at,
            last_login: p.last_login,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsResponse {
    pub theme: String,
    pub auto_logout: bool,
    pub caching_enabled: bool,
    pub notifications_enabled: bool,
}

/// What a user without a settings row sees.
impl Default for SettingsResponse {
    fn default() -> Self {
        Self {
            theme: "light".into(),
            auto_logout: true,
            caching_enabled: true,
            notifications_enabled: true,
        }
    }
}

impl From<SettingsRow> for SettingsResponse {
    fn from(row: SettingsRow) -> Self {
        Self {
            theme: row.theme,
            auto_logout: row.auto_logout,
            caching_enabled: row.caching_enabled,
            notifications_enabled: row.notifications_enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.full_name.is_none() && self.email.is_none() && self.phone.is_none() {
            return Err("no profile fields provided");
        }
        if let Some(email) = &self.email
            && !is_valid_email(email)
        {
            return Err("invalid email format");
        }
        if let Some(phone) = &self.phone
            && !is_valid_phone(phone)
        {
            return Err("invalid phone format");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.current_password.is_empty() || self.new_password.is_empty() {
            return Err("current password and new password are required");
        }
        password::check_policy(&self.new_password)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub theme: Option<String>,
    pub auto_logout: Option<bool>,
    pub caching_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
}

impl UpdateSettingsRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.theme.is_none()
            && self.auto_logout.is_none()
            && self.caching_enabled.is_none()
            && self.notifications_enabled.is_none()
        {
            return Err("no valid settings provided");
        }
        if let Some(theme) = &self.theme
            && theme.trim().is_empty()
        {
            return Err("theme cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().chars().count() < MIN_USERNAME_LEN {
            return Err("username must be at least 3 characters long");
        }
        password::check_policy(&self.password)?;
        if !is_known_role(self.role()) {
            return Err("role must be admin or user");
        }
        if let Some(email) = &self.email
            && !is_valid_email(email)
        {
            return Err("invalid email format");
        }
        if let Some(phone) = &self.phone
            && !is_valid_phone(phone)
        {
            return Err("invalid phone format");
        }
        Ok(())
    }

    pub fn role(&self) -> &str {
        self.role.as_deref().unwrap_or(ROLE_USER)
    }
}
