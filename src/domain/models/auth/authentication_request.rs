//! 인증 미들웨어 동작 방식과 인증 수단

use serde::Serialize;

/// 미들웨어 인증 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// 인증 실패 시 401로 요청을 차단
    Required,
    /// 인증 실패 시 사용자 없이 요청을 진행
    Optional,
}

/// 요청이 어떤 자격 증명으로 인증되었는지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// 서비스 자체 비밀키로 서명된 액세스 토큰
    AccessToken,
    /// 연동 프론트엔드 세션 비밀키로 서명된 토큰
    SecondaryToken,
    /// `X-API-Key` 헤더
    ApiKey,
}
