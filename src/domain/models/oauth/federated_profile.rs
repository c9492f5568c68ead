//! 외부 공급자 ID 토큰 클레임과 검증된 프로필
//!
//! 클레임 구조체는 서명 검증이 끝난 ID 토큰 페이로드이고, 프로필은 그중
//! 인증 오케스트레이터가 사용하는 값만 추린 일회성 구조체입니다.
//! 어느 쪽도 독립적으로 저장되지 않습니다.

use serde::Deserialize;

/// Google ID 토큰 페이로드
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Apple ID 토큰 페이로드
///
/// Apple은 최초 로그인 이후 이메일을 생략할 수 있습니다.
#[derive(Debug, Clone, Deserialize)]
pub struct AppleIdClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// 검증된 Google 프로필
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub email_verified: bool,
}

impl GoogleProfile {
    /// 이름이 없으면 이메일을 표시 이름으로 사용합니다.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.email.clone())
    }
}

/// 검증된 Apple 프로필
#[derive(Debug, Clone, PartialEq)]
pub struct AppleProfile {
    pub sub: String,
    pub email: Option<String>,
}
