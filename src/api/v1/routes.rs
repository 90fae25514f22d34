/*
 * Responsibility
 * - URL layout of v1
 * - Decide which subtrees sit behind the auth gate (apply) or a role gate (apply_role)
 */
use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::api::v1::handlers::{
    auth::{login, logout, verify},
    health::health,
    smetas::{
        create_smeta, delete_smeta, get_smeta, list_smetas, search_smetas, update_smeta,
        update_smeta_status,
    },
    users::{change_password, create_user, get_settings, me, update_me, update_settings},
};
use crate::middleware::auth::access;
use crate::services::auth::ROLE_ADMIN;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify));

    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/users/me", get(me).patch(update_me))
        .route("/users/me/password", post(change_password))
        .route("/users/me/settings", get(get_settings).put(update_settings))
        .route("/smetas", get(list_smetas).post(create_smeta))
        .route("/smetas/search", get(search_smetas))
        .route(
            "/smetas/{id}",
            get(get_smeta).put(update_smeta).delete(delete_smeta),
        )
        .route("/smetas/{id}/status", patch(update_smeta_status));
    let protected = access::apply(protected, state.clone());

    let admin = Router::new().route("/users", post(create_user));
    let admin = access::apply_role(admin, state, ROLE_ADMIN);

    public.merge(protected).merge(admin)
}
