/*
 * Responsibility
 * - The authenticated subject handed to protected handlers
 * - Always re-read from the user store; never rebuilt from token claims alone
 */
use chrono::{DateTime, Utc};

/// Roles are free-form strings in storage. These are the values the API assigns and checks.
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

pub fn is_known_role(role: &str) -> bool {
    matches!(role, ROLE_ADMIN | ROLE_USER)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
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

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
