//! Bearer token check in front of protected routes → `Principal` in request extensions.
//!
//! - `apply`: AuthGate (valid token + active user)
//! - `apply_role`: RoleGate (same, plus an exact role match)
//!
//! For POST/PUT/PATCH the body is buffered so a `token` field can stand in for the
//! Authorization header, then handed back to the handler unchanged.

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Method, Request, header},
    middleware::{self, Next},
    response::Response,
};
use serde_json::Value;

use crate::error::AppError;
use crate::services::auth::{
    AuthRequest, RoleGate,
    gate::is_body_bearing,
    principal::Principal,
};
use crate::state::AppState;

/// Same ceiling as the HTTP body limit layer.
const MAX_BUFFERED_BODY: usize = 1024 * 1024;

/// Require authentication on every route in `router`.
///
/// ```ignore
/// let me = middleware::auth::access::apply(users_routes, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8: from_fn cannot take a State extractor, so pass the state explicitly.
    // route_layer: unmatched paths stay 404 instead of 401
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

/// Require authentication and `role` on every route in `router`.
pub fn apply_role(
    router: Router<AppState>,
    state: AppState,
    role: &'static str,
) -> Router<AppState> {
    let gate = RoleGate::new(state.auth.clone(), role);
    router.route_layer(middleware::from_fn_with_state(gate, role_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (req, seen) = inspect(req).await?;
    let principal = state.auth.authenticate(&seen.auth_request()).await?;

    Ok(forward(req, principal, next).await)
}

async fn role_middleware(
    State(gate): State<RoleGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (req, seen) = inspect(req).await?;
    let principal = gate.require_role(&seen.auth_request()).await?;

    Ok(forward(req, principal, next).await)
}

async fn forward(mut req: Request<Body>, principal: Principal, next: Next) -> Response {
    // middleware → extractor handoff
    req.extensions_mut().insert(principal);
    next.run(req).await
}

/// Owned copy of what the gate looks at. `Body` is not `Sync`, so the request itself
/// cannot be borrowed across the user lookup.
struct Seen {
    method: Method,
    authorization: Option<String>,
    body: Option<Value>,
}

impl Seen {
    fn auth_request(&self) -> AuthRequest<'_> {
        let mut ctx = AuthRequest::new(&self.method);
        if let Some(value) = self.authorization.as_deref() {
            ctx = ctx.with_authorization(value);
        }
        if let Some(body) = self.body.as_ref() {
            ctx = ctx.with_body(body);
        }
        ctx
    }
}

/// Collects header and method, and for body-bearing requests reads the body and puts the
/// same bytes back.
///
/// A body that is not JSON is passed through untouched; it simply offers no token.
async fn inspect(req: Request<Body>) -> Result<(Request<Body>, Seen), AppError> {
    let method = req.method().clone();
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if !is_body_bearing(&method) {
        let seen = Seen {
            method,
            authorization,
            body: None,
        };
        return Ok((req, seen));
    }

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_BUFFERED_BODY)
        .await
        .map_err(|_| AppError::bad_request("BODY_TOO_LARGE", "request body is too large"))?;

    let seen = Seen {
        method,
        authorization,
        body: serde_json::from_slice::<Value>(&bytes).ok(),
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), seen))
}
