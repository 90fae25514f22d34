/*
 * Responsibility
 * - /auth request and response DTOs
 */
use serde::{Deserialize, Serialize};

use crate::api::v1::dto::users::{MIN_USERNAME_LEN, SettingsResponse, UserResponse};
use crate::services::password::MIN_PASSWORD_LEN;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn username(&self) -> &str {
        self.username.trim()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username().chars().count() < MIN_USERNAME_LEN
            || self.password.chars().count() < MIN_PASSWORD_LEN
        {
            return Err("invalid username or password length");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub user: UserResponse,
    pub settings: SettingsResponse,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub settings: SettingsResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_length_checks() {
        let ok: LoginRequest =
            serde_json::from_str(r#"{"username":"  bob ","password":"12345678"}"#).unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.username(), "bob");

        let short: LoginRequest =
            serde_json::from_str(r#"{"username":"bo","password":"12345678"}"#).unwrap();
        assert!(short.validate().is_err());

        let missing: LoginRequest = serde_json::from_str(r#"{"username":"bob"}"#).unwrap();
        assert!(missing.validate().is_err());
    }
}
