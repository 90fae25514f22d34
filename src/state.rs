/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - db pool, public id codec, auth gate, login throttle
 * - Cheap to clone (everything inside is Arc/Clone)
 */
use std::sync::Arc;

use crate::services::{
    auth::{AuthGate, LoginThrottle},
    id_codec::IdCodec,
};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub id_codec: IdCodec,
    pub auth: Arc<AuthGate>,
    pub throttle: Arc<dyn LoginThrottle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("id_codec", &self.id_codec)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        db: sqlx::PgPool,
        id_codec: IdCodec,
        auth: Arc<AuthGate>,
        throttle: Arc<dyn LoginThrottle>,
    ) -> Self {
        Self {
            db,
            id_codec,
            auth,
            throttle,
        }
    }
}
