/*
 * Responsibility
 * - Lookup contract AuthGate uses to re-resolve the token subject on every request
 * - Inactive or deleted accounts must come back as `None`
 */
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repos::{error::RepoError, user_repo};
use crate::services::auth::principal::Principal;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, RepoError>;
}

/// Postgres-backed store over the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, RepoError> {
        let row = user_repo::find_active_by_id(&self.db, id).await?;
        Ok(row.map(Principal::from))
    }
}
