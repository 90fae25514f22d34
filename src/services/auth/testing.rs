//! In-memory collaborators for auth tests.
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::repos::error::RepoError;
use crate::services::auth::{
    gate::AuthGate, principal::Principal, token::TokenCodec, user_store::UserStore,
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: HashMap<i64, Principal>,
    fail: bool,
}

impl MemoryUserStore {
    pub fn with(mut self, user: Principal) -> Self {
        self.users.insert(user.id, user);
        self
    }

    pub fn failing() -> Self {
        Self {
            users: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>, RepoError> {
        if self.fail {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(self.users.get(&id).filter(|u| u.is_active).cloned())
    }
}

pub fn principal(id: i64, username: &str, role: &str) -> Principal {
    Principal {
        id,
        username: username.to_string(),
        full_name: None,
        email: None,
        phone: None,
        role: role.to_string(),
        is_active: true,
        created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        last_login: None,
    }
}

pub fn gate_with(secret: &str, store: MemoryUserStore) -> AuthGate {
    AuthGate::new(Arc::new(TokenCodec::new(secret, 3600)), Arc::new(store))
}
