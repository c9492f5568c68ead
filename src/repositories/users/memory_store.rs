//! 메모리 기반 사용자 저장소
//!
//! MongoDB 구현과 같은 의미론(이메일/공급자 ID 유일성, 조건부 리프레시 토큰 교체)을
//! 하나의 `RwLock` 아래에서 제공합니다. 테스트와 로컬 실행용입니다.

use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;

use super::user_store::UserStore;
use crate::config::AuthProvider;
use crate::core::{AppError, AppResult};
use crate::domain::entities::users::{User, UserChanges};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<ObjectId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn find_where<F>(&self, predicate: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users.read().values().find(|user| predicate(user)).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.find_where(|user| user.email == email))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        Ok(self.users.read().get(&object_id).cloned())
    }

    async fn find_by_provider_id(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> AppResult<Option<User>> {
        if provider == AuthProvider::Local {
            return Ok(None);
        }
        Ok(self.find_where(|user| user.provider_id(provider) == Some(subject)))
    }

    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> AppResult<Option<User>> {
        Ok(self.find_where(|user| user.api_key_hash.as_deref() == Some(api_key_hash)))
    }

    async fn create(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write();

        let collides = users.values().any(|existing| {
            existing.id == user.id
                || existing.email == user.email
                || (user.google_id.is_some() && existing.google_id == user.google_id)
                || (user.apple_id.is_some() && existing.apple_id == user.apple_id)
        });
        if collides {
            return Err(AppError::AlreadyExists);
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: &str, changes: UserChanges) -> AppResult<Option<User>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let mut users = self.users.write();
        Ok(users.get_mut(&object_id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }

    async fn replace_refresh_token(&self, id: &str, expected: &str, next: &str) -> AppResult<bool> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(false);
        };

        let mut users = self.users.write();
        match users.get_mut(&object_id) {
            Some(user) if user.is_active && user.refresh_token.as_deref() == Some(expected) => {
                UserChanges {
                    refresh_token: Some(Some(next.to_string())),
                    ..UserChanges::default()
                }
                .apply_to(user);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
