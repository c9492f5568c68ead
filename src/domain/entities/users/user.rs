//! User Entity Implementation
//!
//! 애플리케이션 사용자(Identity) 엔티티입니다.
//! 로컬 인증과 Google/Apple 외부 공급자 인증을 하나의 모델로 표현합니다.
//!
//! ## 불변 조건
//!
//! - 이메일은 공급자와 무관하게 전역에서 유일하며, 항상 소문자로 정규화되어 저장됩니다.
//! - `password_hash`는 `auth_provider == Local`인 경우에만 존재합니다.
//! - `auth_provider`는 생성 이후 바뀌지 않습니다. 로컬 계정은 외부 공급자 ID를 추가로
//!   연결할 수 있지만, 외부 공급자 계정을 다른 공급자가 가져갈 수는 없습니다.
//! - 계정은 삭제되지 않고 `is_active = false`로 비활성화됩니다.

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::config::AuthProvider;

/// 구독 등급
///
/// 액세스 토큰의 `subscription` 클레임과 등급별 요청 한도에 사용됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Basic,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Premium => "premium",
        }
    }
}

/// 사용자 엔티티
///
/// MongoDB `users` 컬렉션의 문서 구조와 1:1로 대응합니다.
/// `id`는 생성 시점에 애플리케이션에서 부여하므로, 첫 토큰 쌍을 포함한
/// 레코드를 한 번의 insert로 저장할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    /// 정규화된(trim + 소문자) 이메일
    pub email: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    pub auth_provider: AuthProvider,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,

    #[serde(default)]
    pub subscription: SubscriptionTier,

    #[serde(default)]
    pub avatar_count: u32,

    pub is_active: bool,

    pub email_verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime>,

    /// 현재 유효한 단 하나의 리프레시 토큰
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// 현재 API 키의 SHA-256 다이제스트 (평문은 저장하지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_hash: Option<String>,

    pub created_at: DateTime,

    pub updated_at: DateTime,
}

impl User {
    /// 이메일/비밀번호로 가입하는 로컬 사용자를 생성합니다.
    ///
    /// 로컬 사용자는 이메일 인증 전 상태로 시작합니다.
    pub fn new_local(email: String, name: String, password_hash: String) -> Self {
        let now = DateTime::now();

        Self {
            id: ObjectId::new(),
            email,
            name,
            password_hash: Some(password_hash),
            auth_provider: AuthProvider::Local,
            google_id: None,
            apple_id: None,
            profile_picture: None,
            subscription: SubscriptionTier::Free,
            avatar_count: 0,
            is_active: true,
            email_verified: false,
            last_login_at: None,
            refresh_token: None,
            api_key_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 외부 공급자 로그인으로 처음 가입하는 사용자를 생성합니다.
    ///
    /// 공급자가 이메일을 검증했으므로 `email_verified`는 `true`로 시작합니다.
    ///
    /// # Arguments
    ///
    /// * `provider` - `Google` 또는 `Apple`
    /// * `subject` - 공급자가 발급한 사용자 식별자(`sub`)
    pub fn new_federated(
        email: String,
        name: String,
        provider: AuthProvider,
        subject: String,
        profile_picture: Option<String>,
    ) -> Self {
        let now = DateTime::now();

        let mut user = Self {
            id: ObjectId::new(),
            email,
            name,
            password_hash: None,
            auth_provider: provider,
            google_id: None,
            apple_id: None,
            profile_picture,
            subscription: SubscriptionTier::Free,
            avatar_count: 0,
            is_active: true,
            email_verified: true,
            last_login_at: Some(now),
            refresh_token: None,
            api_key_hash: None,
            created_at: now,
            updated_at: now,
        };
        user.set_provider_id(provider, subject);
        user
    }

    pub fn id_string(&self) -> String {
        self.id.to_hex()
    }

    pub fn is_local_auth(&self) -> bool {
        matches!(self.auth_provider, AuthProvider::Local)
    }

    pub fn can_authenticate_with_password(&self) -> bool {
        self.is_local_auth() && self.password_hash.is_some()
    }

    /// 주어진 공급자에 연결된 subject ID
    pub fn provider_id(&self, provider: AuthProvider) -> Option<&str> {
        match provider {
            AuthProvider::Google => self.google_id.as_deref(),
            AuthProvider::Apple => self.apple_id.as_deref(),
            AuthProvider::Local => None,
        }
    }

    fn set_provider_id(&mut self, provider: AuthProvider, subject: String) {
        match provider {
            AuthProvider::Google => self.google_id = Some(subject),
            AuthProvider::Apple => self.apple_id = Some(subject),
            AuthProvider::Local => {}
        }
    }
}

/// 사용자 부분 갱신 필드 집합
///
/// `None`은 변경하지 않음을, `Some(None)`은 nullable 필드를 비움을 의미합니다.
/// 저장소 구현은 이 집합을 하나의 원자적 갱신 연산으로 적용해야 합니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub google_id: Option<String>,
    pub apple_id: Option<String>,
    pub profile_picture: Option<String>,
    pub email_verified: Option<bool>,
    pub is_active: Option<bool>,
    pub last_login_at: Option<DateTime>,
    pub refresh_token: Option<Option<String>>,
    pub api_key_hash: Option<Option<String>>,
}

impl UserChanges {
    /// 로그인 성공 시의 공통 변경: 마지막 로그인 시각과 새 리프레시 토큰
    pub fn login(refresh_token: String) -> Self {
        Self {
            last_login_at: Some(DateTime::now()),
            refresh_token: Some(Some(refresh_token)),
            ..Self::default()
        }
    }

    /// 외부 공급자 ID를 연결합니다.
    pub fn link_provider(mut self, provider: AuthProvider, subject: String) -> Self {
        match provider {
            AuthProvider::Google => self.google_id = Some(subject),
            AuthProvider::Apple => self.apple_id = Some(subject),
            AuthProvider::Local => {}
        }
        self.email_verified = Some(true);
        self
    }

    /// 메모리 내 엔티티에 변경 사항을 적용합니다.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(google_id) = &self.google_id {
            user.google_id = Some(google_id.clone());
        }
        if let Some(apple_id) = &self.apple_id {
            user.apple_id = Some(apple_id.clone());
        }
        if let Some(picture) = &self.profile_picture {
            user.profile_picture = Some(picture.clone());
        }
        if let Some(verified) = self.email_verified {
            user.email_verified = verified;
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        if let Some(at) = self.last_login_at {
            user.last_login_at = Some(at);
        }
        if let Some(token) = &self.refresh_token {
            user.refresh_token = token.clone();
        }
        if let Some(hash) = &self.api_key_hash {
            user.api_key_hash = hash.clone();
        }
        user.updated_at = DateTime::now();
    }
}
