//! Google 인증 코드 플로우 응답

use serde::Deserialize;

/// Google 토큰 엔드포인트 응답
///
/// `openid` 스코프를 요청했으므로 `id_token`이 함께 옵니다.
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}
