/*
 * Responsibility
 * - Token payload types: the raw JSON map returned by TokenCodec::parse and the typed Claims
 * - ClaimsValidator: required claim presence/type checks and expiry, done once at this boundary
 *
 * Notes
 * - A payload without `exp` never expires. Login always sets it; other issuers may not.
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Payload as decoded from the wire, shape not yet validated.
pub type RawClaims = Map<String, Value>;

/// Validated token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    /// Unix timestamp (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("missing or invalid claim: {0}")]
    InvalidClaims(&'static str),
    #[error("token expired")]
    Expired,
}

fn non_empty_str(raw: &RawClaims, key: &'static str) -> Result<String, ClaimsError> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
        .ok_or(ClaimsError::InvalidClaims(key))
}

/// Validate `raw` against the clock value `now` (Unix seconds).
pub fn check(raw: &RawClaims, now: i64) -> Result<Claims, ClaimsError> {
    // as_i64 is None for floats, strings, and integers beyond i64
    let user_id = raw
        .get("user_id")
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .ok_or(ClaimsError::InvalidClaims("user_id"))?;

    let username = non_empty_str(raw, "username")?;
    let role = non_empty_str(raw, "role")?;

    let exp = match raw.get("exp") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_i64().ok_or(ClaimsError::InvalidClaims("exp"))?),
    };

    if let Some(exp) = exp
        && exp < now
    {
        return Err(ClaimsError::Expired);
    }

    Ok(Claims {
        user_id,
        username,
        role,
        exp,
    })
}

pub fn check_now(raw: &RawClaims) -> Result<Claims, ClaimsError> {
    check(raw, chrono::Utc::now().timestamp())
}
