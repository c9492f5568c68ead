//! # MongoDB 사용자 저장소
//!
//! `users` 컬렉션에 대한 [`UserStore`] 구현입니다.
//!
//! ## 특징
//!
//! - **유니크 인덱스**: `email`, 그리고 sparse 유니크 `google_id` / `apple_id` / `api_key_hash`
//! - **원자적 갱신**: 모든 변경은 `find_one_and_update` 또는 조건부 `update_one` 한 번으로 수행
//! - **중복 감지**: 동시 가입 경쟁은 유니크 인덱스의 E11000 에러로 판정하여 `AlreadyExists`로 변환

use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, IndexModel};

use super::user_store::UserStore;
use crate::config::AuthProvider;
use crate::core::{AppError, AppResult};
use crate::db::Database;
use crate::domain::entities::users::{User, UserChanges};

const COLLECTION: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    /// 컬렉션 핸들을 만들고 인덱스를 보장합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::DatabaseError` - 인덱스 생성 실패
    pub async fn new(database: &Database) -> AppResult<Self> {
        let store = Self {
            collection: database.get_database().collection::<User>(COLLECTION),
        };
        store.create_indexes().await?;
        Ok(store)
    }

    async fn create_indexes(&self) -> AppResult<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        let sparse_unique = |field: &str| {
            IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name(format!("{}_unique", field))
                        .build(),
                )
                .build()
        };

        self.collection
            .create_indexes([
                email_index,
                sparse_unique("google_id"),
                sparse_unique("apple_id"),
                sparse_unique("api_key_hash"),
            ])
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        log::info!("users 컬렉션 인덱스 확인 완료");
        Ok(())
    }

    async fn find_one(&self, filter: Document) -> AppResult<Option<User>> {
        self.collection
            .find_one(filter)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one(doc! { "email": email }).await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        self.find_one(doc! { "_id": object_id }).await
    }

    async fn find_by_provider_id(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> AppResult<Option<User>> {
        let field = match provider {
            AuthProvider::Google => "google_id",
            AuthProvider::Apple => "apple_id",
            AuthProvider::Local => return Ok(None),
        };
        self.find_one(doc! { field: subject }).await
    }

    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> AppResult<Option<User>> {
        self.find_one(doc! { "api_key_hash": api_key_hash }).await
    }

    async fn create(&self, user: User) -> AppResult<User> {
        match self.collection.insert_one(&user).await {
            Ok(_) => Ok(user),
            Err(e) if is_duplicate_key(&e) => {
                log::debug!("중복 키로 사용자 생성 거부: {}", e);
                Err(AppError::AlreadyExists)
            }
            Err(e) => Err(AppError::DatabaseError(e.to_string())),
        }
    }

    async fn update(&self, id: &str, changes: UserChanges) -> AppResult<Option<User>> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(doc! { "_id": object_id }, update_document(&changes))
            .with_options(options)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    async fn replace_refresh_token(&self, id: &str, expected: &str, next: &str) -> AppResult<bool> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(false);
        };

        let result = self
            .collection
            .update_one(
                doc! { "_id": object_id, "refresh_token": expected, "is_active": true },
                doc! { "$set": { "refresh_token": next, "updated_at": DateTime::now() } },
            )
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(result.modified_count == 1)
    }
}

/// `UserChanges`를 `$set` / `$unset` 갱신 문서로 변환합니다.
fn update_document(changes: &UserChanges) -> Document {
    let mut set = doc! { "updated_at": DateTime::now() };
    let mut unset = Document::new();

    if let Some(google_id) = &changes.google_id {
        set.insert("google_id", google_id.clone());
    }
    if let Some(apple_id) = &changes.apple_id {
        set.insert("apple_id", apple_id.clone());
    }
    if let Some(picture) = &changes.profile_picture {
        set.insert("profile_picture", picture.clone());
    }
    if let Some(verified) = changes.email_verified {
        set.insert("email_verified", verified);
    }
    if let Some(active) = changes.is_active {
        set.insert("is_active", active);
    }
    if let Some(at) = changes.last_login_at {
        set.insert("last_login_at", at);
    }
    for (field, value) in [
        ("refresh_token", &changes.refresh_token),
        ("api_key_hash", &changes.api_key_hash),
    ] {
        match value {
            Some(Some(v)) => {
                set.insert(field, v.clone());
            }
            Some(None) => {
                unset.insert(field, "");
            }
            None => {}
        }
    }

    let mut update = doc! { "$set": set };
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_document_sets_and_unsets() {
        let changes = UserChanges {
            google_id: Some("g1".to_string()),
            email_verified: Some(true),
            refresh_token: Some(None),
            api_key_hash: Some(Some("digest".to_string())),
            ..UserChanges::default()
        };

        let update = update_document(&changes);
        let set = update.get_document("$set").unwrap();
        let unset = update.get_document("$unset").unwrap();

        assert_eq!(set.get_str("google_id").unwrap(), "g1");
        assert!(set.get_bool("email_verified").unwrap());
        assert_eq!(set.get_str("api_key_hash").unwrap(), "digest");
        assert!(set.contains_key("updated_at"));
        assert!(unset.contains_key("refresh_token"));
        assert!(!set.contains_key("refresh_token"));
    }

    #[test]
    fn test_update_document_without_unset() {
        let update = update_document(&UserChanges::login("rt".to_string()));

        assert!(update.get_document("$unset").is_err());
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("refresh_token").unwrap(), "rt");
        assert!(set.contains_key("last_login_at"));
    }
}
