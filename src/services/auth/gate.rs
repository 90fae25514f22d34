/*
 * Responsibility
 * - AuthGate: token extraction → TokenCodec::parse → claims::check → UserStore lookup → Principal
 * - RoleGate: AuthGate + exact role match
 *
 * Notes
 * - Every internal failure (decode, signature, claims, expiry) collapses into one
 *   `Unauthenticated(InvalidToken)` so callers cannot tell them apart. The precise reason
 *   only goes to the log.
 * - No retries and no session renewal. A rejected request needs a new token.
 */
use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::services::auth::{
    claims::{self, Claims},
    principal::Principal,
    token::TokenCodec,
    user_store::UserStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthenticated {
    NoToken,
    InvalidToken,
    UserNotFound,
    LookupFailed,
}

impl Unauthenticated {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoToken => "no token provided",
            Self::InvalidToken => "invalid or expired token",
            Self::UserNotFound => "user not found",
            Self::LookupFailed => "authentication failed",
        }
    }
}

/// Outcome of a failed authorization attempt as seen by the endpoint layer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("{}", .0.message())]
    Unauthenticated(Unauthenticated),
    #[error("insufficient role")]
    Forbidden,
}

/// What the gate needs to know about an inbound request.
///
/// The HTTP layer fills this in; the gate never touches raw request bytes.
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    pub method: &'a Method,
    pub authorization: Option<&'a str>,
    pub body: Option<&'a Value>,
}

impl<'a> AuthRequest<'a> {
    pub fn new(method: &'a Method) -> Self {
        Self {
            method,
            authorization: None,
            body: None,
        }
    }

    pub fn with_authorization(mut self, value: &'a str) -> Self {
        self.authorization = Some(value);
        self
    }

    pub fn with_body(mut self, body: &'a Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Header first; the body `token` field only for methods that carry a body.
    pub fn candidate_token(&self) -> Option<&'a str> {
        if let Some(token) = self.authorization.and_then(bearer_token) {
            return Some(token);
        }

        if !is_body_bearing(self.method) {
            return None;
        }

        self.body
            .and_then(|b| b.get("token"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }
}

pub fn is_body_bearing(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, rest) = value.trim_start().split_once(char::is_whitespace)?;
    if scheme != "Bearer" {
        return None;
    }
    rest.split_whitespace().next()
}

pub struct AuthGate {
    codec: Arc<TokenCodec>,
    users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn UserStore>) -> Self {
        Self { codec, users }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Signature + claims check without the user lookup.
    pub fn verify_token(&self, token: &str) -> Result<Claims, Rejection> {
        let raw = self.codec.parse(token).map_err(|err| {
            warn!(error = %err, "authentication failed: token rejected");
            Rejection::Unauthenticated(Unauthenticated::InvalidToken)
        })?;

        claims::check_now(&raw).map_err(|err| {
            warn!(error = %err, "authentication failed: claims rejected");
            Rejection::Unauthenticated(Unauthenticated::InvalidToken)
        })
    }

    pub async fn authenticate(&self, req: &AuthRequest<'_>) -> Result<Principal, Rejection> {
        let Some(token) = req.candidate_token() else {
            warn!(method = %req.method, "authentication failed: no token provided");
            return Err(Rejection::Unauthenticated(Unauthenticated::NoToken));
        };

        let claims = self.verify_token(token)?;

        match self.users.find_by_id(claims.user_id).await {
            Ok(Some(principal)) => {
                debug!(
                    user_id = principal.id,
                    username = %principal.username,
                    "user authenticated"
                );
                Ok(principal)
            }
            Ok(None) => {
                warn!(user_id = claims.user_id, "authentication failed: user not found");
                Err(Rejection::Unauthenticated(Unauthenticated::UserNotFound))
            }
            Err(err) => {
                error!(
                    user_id = claims.user_id,
                    error = %err,
                    "user lookup failed during authentication"
                );
                Err(Rejection::Unauthenticated(Unauthenticated::LookupFailed))
            }
        }
    }
}

/// Exact role match; no hierarchy.
pub fn ensure_role(principal: &Principal, role: &str) -> Result<(), Rejection> {
    if principal.has_role(role) {
        return Ok(());
    }

    warn!(
        user_id = principal.id,
        role = %principal.role,
        required = %role,
        "access denied: insufficient role"
    );
    Err(Rejection::Forbidden)
}

/// AuthGate bound to one required role.
#[derive(Clone, Debug)]
pub struct RoleGate {
    auth: Arc<AuthGate>,
    role: &'static str,
}

impl RoleGate {
    pub fn new(auth: Arc<AuthGate>, role: &'static str) -> Self {
        Self { auth, role }
    }

    pub async fn require_role(&self, req: &AuthRequest<'_>) -> Result<Principal, Rejection> {
        let principal = self.auth.authenticate(req).await?;
        ensure_role(&principal, self.role)?;
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::testing::{MemoryUserStore, gate_with, principal};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn admin_token() -> String {
        TokenCodec::new(SECRET, 3600)
            .generate(&Claims {
                user_id: 1,
                username: "alice".into(),
                role: "admin".into(),
                exp: None,
            })
            .unwrap()
    }

    fn store_with_alice() -> MemoryUserStore {
        MemoryUserStore::default().with(principal(1, "alice", "admin"))
    }

    #[test]
    fn bearer_header_is_parsed() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer   abc  trailing"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("bearer abc"), None);
    }

    #[test]
    fn header_wins_over_body() {
        let body = json!({"token": "from-body"});
        let req = AuthRequest::new(&Method::POST)
            .with_authorization("Bearer from-header")
            .with_body(&body);
        assert_eq!(req.candidate_token(), Some("from-header"));
    }

    #[test]
    fn body_token_only_for_body_bearing_methods() {
        let body = json!({"token": "from-body"});

        let post = AuthRequest::new(&Method::POST).with_body(&body);
        assert_eq!(post.candidate_token(), Some("from-body"));

        let get = AuthRequest::new(&Method::GET).with_body(&body);
        assert_eq!(get.candidate_token(), None);

        let delete = AuthRequest::new(&Method::DELETE).with_body(&body);
        assert_eq!(delete.candidate_token(), None);
    }

    #[test]
    fn non_bearer_header_falls_back_to_body() {
        let body = json!({"token": "from-body"});
        let req = AuthRequest::new(&Method::POST)
            .with_authorization("Basic Zm9vOmJhcg==")
            .with_body(&body);
        assert_eq!(req.candidate_token(), Some("from-body"));
    }

    #[tokio::test]
    async fn get_without_header_is_no_token() {
        let gate = gate_with(SECRET, store_with_alice());
        let err = gate
            .authenticate(&AuthRequest::new(&Method::GET))
            .await
            .unwrap_err();

        assert_eq!(err, Rejection::Unauthenticated(Unauthenticated::NoToken));
        assert_eq!(err.to_string(), "no token provided");
    }

    #[tokio::test]
    async fn fresh_admin_token_authenticates() {
        let gate = gate_with(SECRET, store_with_alice());
        let header = format!("Bearer {}", admin_token());
        let req = AuthRequest::new(&Method::GET).with_authorization(&header);

        let principal = gate.authenticate(&req).await.unwrap();
        assert_eq!(principal.id, 1);
        assert_eq!(principal.role, "admin");
    }

    #[tokio::test]
    async fn role_gate_matches_exact_role() {
        let gate = Arc::new(gate_with(SECRET, store_with_alice()));
        let header = format!("Bearer {}", admin_token());
        let req = AuthRequest::new(&Method::GET).with_authorization(&header);

        let admin = RoleGate::new(gate.clone(), "admin");
        assert_eq!(admin.require_role(&req).await.unwrap().username, "alice");

        let superadmin = RoleGate::new(gate, "superadmin");
        let err = superadmin.require_role(&req).await.unwrap_err();
        assert_eq!(err, Rejection::Forbidden);
        assert_eq!(err.to_string(), "insufficient role");
    }

    #[tokio::test]
    async fn role_gate_propagates_authentication_failure() {
        let gate = Arc::new(gate_with(SECRET, store_with_alice()));
        let err = RoleGate::new(gate, "admin")
            .require_role(&AuthRequest::new(&Method::GET))
            .await
            .unwrap_err();
        assert_eq!(err, Rejection::Unauthenticated(Unauthenticated::NoToken));
    }

    #[tokio::test]
    async fn body_token_authenticates_post() {
        let gate = gate_with(SECRET, store_with_alice());
        let body = json!({ "token": admin_token() });
        let req = AuthRequest::new(&Method::POST).with_body(&body);

        assert_eq!(gate.authenticate(&req).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn internal_reasons_collapse_to_invalid_token() {
        let gate = gate_with(SECRET, store_with_alice());
        let other_secret = TokenCodec::new("other", 60)
            .generate(&Claims {
                user_id: 1,
                username: "alice".into(),
                role: "admin".into(),
                exp: None,
            })
            .unwrap();
        let expired = TokenCodec::new(SECRET, 60)
            .generate(&Claims {
                user_id: 1,
                username: "alice".into(),
                role: "admin".into(),
                exp: Some(chrono::Utc::now().timestamp() - 1),
            })
            .unwrap();

        for token in ["garbage", "a.b.c", other_secret.as_str(), expired.as_str()] {
            let header = format!("Bearer {token}");
            let req = AuthRequest::new(&Method::GET).with_authorization(&header);
            let err = gate.authenticate(&req).await.unwrap_err();

            assert_eq!(
                err,
                Rejection::Unauthenticated(Unauthenticated::InvalidToken)
            );
            assert_eq!(err.to_string(), "invalid or expired token");
        }
    }

    #[tokio::test]
    async fn missing_or_inactive_user_is_rejected() {
        let mut inactive = principal(1, "alice", "admin");
        inactive.is_active = false;
        let gate = gate_with(SECRET, MemoryUserStore::default().with(inactive));

        let header = format!("Bearer {}", admin_token());
        let req = AuthRequest::new(&Method::GET).with_authorization(&header);
        let err = gate.authenticate(&req).await.unwrap_err();

        assert_eq!(
            err,
            Rejection::Unauthenticated(Unauthenticated::UserNotFound)
        );
        assert_eq!(err.to_string(), "user not found");
    }

    #[tokio::test]
    async fn store_failure_is_unauthenticated() {
        let gate = gate_with(SECRET, MemoryUserStore::failing());
        let header = format!("Bearer {}", admin_token());
        let req = AuthRequest::new(&Method::GET).with_authorization(&header);

        assert_eq!(
            gate.authenticate(&req).await.unwrap_err(),
            Rejection::Unauthenticated(Unauthenticated::LookupFailed)
        );
    }

    #[tokio::test]
    async fn principal_reflects_store_not_token() {
        // role changed after the token was issued
        let gate = gate_with(
            SECRET,
            MemoryUserStore::default().with(principal(1, "alice", "user")),
        );
        let header = format!("Bearer {}", admin_token());
        let req = AuthRequest::new(&Method::GET).with_authorization(&header);

        assert_eq!(gate.authenticate(&req).await.unwrap().role, "user");
    }
}
