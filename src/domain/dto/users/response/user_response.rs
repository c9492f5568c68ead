//! 사용자 응답 DTO
//!
//! 비밀번호 해시, 리프레시 토큰, API 키 다이제스트는 응답에 절대 포함되지 않습니다.

use serde::Serialize;

use crate::config::AuthProvider;
use crate::domain::entities::users::{SubscriptionTier, User};
use crate::domain::models::token::TokenPair;

/// 공개 사용자 정보
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub auth_provider: AuthProvider,
    pub subscription: SubscriptionTier,
    pub profile_picture: Option<String>,
    pub avatar_count: u32,
    pub email_verified: bool,
    pub is_active: bool,
    pub has_api_key: bool,
    pub last_login: Option<String>,
    pub created_at: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            auth_provider: user.auth_provider,
            subscription: user.subscription,
            profile_picture: user.profile_picture.clone(),
            avatar_count: user.avatar_count,
            email_verified: user.email_verified,
            is_active: user.is_active,
            has_api_key: user.api_key_hash.is_some(),
            last_login: user
                .last_login_at
                .and_then(|at| at.try_to_rfc3339_string().ok()),
            created_at: user.created_at.try_to_rfc3339_string().ok(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse::from(&user)
    }
}

/// 로그인/가입 성공 응답
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_user: Option<bool>,
}

/// API 키 발급 응답. 평문 키는 이 응답에서 단 한 번만 노출됩니다.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub api_key: String,
}
