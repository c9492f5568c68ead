//! JWT 클레임 구조체와 토큰 쌍
//!
//! 액세스 토큰은 `{id, email, subscription, exp}`, 리프레시 토큰은 `{id, exp}`를
//! 와이어 클레임으로 가집니다. 여기에 `iat`, `jti`, `token_type`을 더해
//! 같은 초에 발급된 토큰도 서로 다르게 만들고, 리프레시 토큰이 액세스 토큰으로
//! 쓰이지 않도록 구분합니다.

use serde::{Deserialize, Serialize};

use crate::domain::entities::users::SubscriptionTier;

/// 토큰 용도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// 액세스 토큰 클레임
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: String,
    pub email: String,
    pub subscription: SubscriptionTier,
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// 리프레시 토큰 클레임
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: String,
    pub token_type: TokenType,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// 인증 미들웨어가 해석하는 느슨한 클레임
///
/// 보조 비밀키로 서명된 토큰은 다른 시스템이 발급하므로 `id`와 `email` 중
/// 하나만 있을 수 있고 `token_type`도 없을 수 있습니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BearerClaims {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub token_type: Option<TokenType>,
}

/// 액세스 + 리프레시 토큰 쌍
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// 액세스 토큰 만료까지 남은 초
    pub expires_in: i64,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
