//! # 사용자 저장소 인터페이스
//!
//! 인증 코어가 사용하는 사용자 레코드 저장소의 계약입니다.
//! 운영 환경에서는 [`MongoUserStore`](super::user_repo::MongoUserStore),
//! 테스트와 로컬 실행에서는 [`InMemoryUserStore`](super::memory_store::InMemoryUserStore)를 사용합니다.
//!
//! ## 계약
//!
//! - 이메일 인자는 호출자가 이미 정규화(trim + 소문자)한 값입니다.
//! - `create`는 이메일 충돌 시 `AppError::AlreadyExists`를 반환해야 하며,
//!   동시에 들어온 중복 가입도 저장소 수준에서 막아야 합니다.
//! - `update`와 `replace_refresh_token`은 각각 하나의 원자적 연산입니다.
//! - 찾지 못한 경우는 에러가 아니라 `None`/`false`입니다.
//!   형식이 잘못된 ID도 "없음"으로 취급합니다.
//! - I/O 실패는 `AppError::DatabaseError`로 그대로 전달하며 재시도하지 않습니다.

use async_trait::async_trait;

use crate::config::AuthProvider;
use crate::core::AppResult;
use crate::domain::entities::users::{User, UserChanges};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// 정규화된 이메일로 사용자 조회
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 16진수 ObjectId 문자열로 사용자 조회
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// 외부 공급자 subject ID로 사용자 조회
    ///
    /// `AuthProvider::Local`에는 subject ID가 없으므로 항상 `None`입니다.
    async fn find_by_provider_id(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> AppResult<Option<User>>;

    /// API 키 다이제스트로 사용자 조회
    async fn find_by_api_key_hash(&self, api_key_hash: &str) -> AppResult<Option<User>>;

    /// 새 사용자 저장
    ///
    /// # Errors
    ///
    /// * `AppError::AlreadyExists` - 이메일(또는 공급자 ID) 중복
    async fn create(&self, user: User) -> AppResult<User>;

    /// 부분 갱신 후 갱신된 사용자를 반환합니다. 사용자가 없으면 `None`.
    async fn update(&self, id: &str, changes: UserChanges) -> AppResult<Option<User>>;

    /// 저장된 리프레시 토큰이 `expected`이고 계정이 활성 상태일 때만 `next`로 교체합니다.
    ///
    /// 교체했으면 `true`, 조건이 맞지 않으면 `false`를 반환합니다.
    async fn replace_refresh_token(&self, id: &str, expected: &str, next: &str) -> AppResult<bool>;
}
