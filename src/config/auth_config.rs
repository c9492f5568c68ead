//! # Authentication Configuration Module
//!
//! JWT 서명 비밀키, 외부 공급자(Google/Apple) 설정, API 키 형식 등
//! 인증 관련 설정을 환경 변수에서 읽어옵니다.
//!
//! ## 필수 환경 변수 설정
//!
//! ### JWT 토큰 설정
//! ```bash
//! export JWT_SECRET="your-super-secret-jwt-key"
//! export NEXTAUTH_SECRET="allied-frontend-session-secret"   # 선택
//! export JWT_EXPIRATION_HOURS="1"
//! export JWT_REFRESH_EXPIRATION_DAYS="7"
//! ```
//!
//! ### Google / Apple 설정
//! ```bash
//! export GOOGLE_CLIENT_ID="your-google-client-id"
//! export GOOGLE_CLIENT_SECRET="your-google-client-secret"
//! export GOOGLE_REDIRECT_URI="http://localhost:8080/api/v1/auth/google/callback"
//! export APPLE_CLIENT_ID="com.example.prefs"
//! ```
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::config::{GoogleOAuthConfig, JwtConfig, JwtSettings};
//!
//! let client_id = GoogleOAuthConfig::client_id();
//! let settings = JwtSettings::from_env()?;
//! ```
//!
//! 프로덕션에서 `JWT_SECRET`/`OAUTH_STATE_SECRET`가 비어 있으면 기본값 대신 에러를 반환합니다.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_config::Environment;
use crate::core::{AppError, AppResult};

/// Google OAuth 2.0 / OpenID Connect 설정
pub struct GoogleOAuthConfig;

impl GoogleOAuthConfig {
    /// Google Cloud Console에서 발급받은 클라이언트 ID
    ///
    /// ID 토큰의 `aud` 클레임이 이 값과 일치해야 합니다.
    pub fn client_id() -> String {
        env::var("GOOGLE_CLIENT_ID").unwrap_or_else(|_| {
            log::warn!("GOOGLE_CLIENT_ID not set, Google sign-in will reject every token");
            String::new()
        })
    }

    /// 인증 코드 교환에 사용하는 클라이언트 시크릿
    pub fn client_secret() -> String {
        env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default()
    }

    /// 인증 코드 플로우의 콜백 URI
    pub fn redirect_uri() -> String {
        env::var("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|_| "http://localhost:8080/api/v1/auth/google/callback".to_string())
    }

    pub fn auth_uri() -> String {
        env::var("GOOGLE_AUTH_URI")
            .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string())
    }

    pub fn token_uri() -> String {
        env::var("GOOGLE_TOKEN_URI")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string())
    }

    /// Google 공개키 집합(JWKS) 주소
    pub fn jwks_uri() -> String {
        env::var("GOOGLE_JWKS_URI")
            .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v3/certs".to_string())
    }

    /// Google ID 토큰이 가질 수 있는 `iss` 값
    pub fn issuers() -> Vec<String> {
        vec![
            "accounts.google.com".to_string(),
            "https://accounts.google.com".to_string(),
        ]
    }
}

/// Sign in with Apple 설정
pub struct AppleConfig;

impl AppleConfig {
    /// Apple Services ID 또는 번들 ID. ID 토큰의 `aud`와 비교됩니다.
    pub fn client_id() -> String {
        env::var("APPLE_CLIENT_ID").unwrap_or_else(|_| {
            log::warn!("APPLE_CLIENT_ID not set, Apple sign-in will reject every token");
            String::new()
        })
    }

    pub fn jwks_uri() -> String {
        env::var("APPLE_JWKS_URI")
            .unwrap_or_else(|_| "https://appleid.apple.com/auth/keys".to_string())
    }

    pub fn issuer() -> String {
        "https://appleid.apple.com".to_string()
    }
}

/// JWT 토큰 설정
pub struct JwtConfig;

impl JwtConfig {
    /// 서비스 자체 토큰 서명 비밀키 (HS256)
    ///
    /// # 보안 고려사항
    ///
    /// - 프로덕션에서는 32바이트 이상의 무작위 값을 사용해야 합니다.
    /// - 설정되지 않으면 개발 환경에서만 기본값을 사용하며 경고를 남깁니다.
    ///
    /// # Errors
    ///
    /// 프로덕션에서 값이 없으면 `AppError::InternalError`
    pub fn secret() -> AppResult<String> {
        signing_secret(
            "JWT_SECRET",
            env::var("JWT_SECRET").ok(),
            "your-secret-key",
            &Environment::current(),
        )
    }

    /// 연동된 프론트엔드 세션 시스템의 비밀키
    ///
    /// 설정된 경우에만 인증 미들웨어의 보조 검증 전략이 활성화됩니다.
    pub fn secondary_secret() -> Option<String> {
        env::var("NEXTAUTH_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
    }

    /// 액세스 토큰 만료 시간 (시간 단위, 기본 1시간)
    pub fn expiration_hours() -> i64 {
        env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .unwrap_or(1)
    }

    /// 리프레시 토큰 만료 기간 (일 단위, 기본 7일)
    pub fn refresh_expiration_days() -> i64 {
        env::var("JWT_REFRESH_EXPIRATION_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7)
    }
}

/// 토큰 서비스가 사용하는 JWT 설정 스냅샷
///
/// 환경 변수는 시작 시 한 번만 읽고, 이후에는 이 값을 서비스에 주입합니다.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub secondary_secret: Option<String>,
    pub access_ttl_hours: i64,
    pub refresh_ttl_days: i64,
    pub api_key_prefix: String,
}

impl JwtSettings {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            secret: JwtConfig::secret()?,
            secondary_secret: JwtConfig::secondary_secret(),
            access_ttl_hours: JwtConfig::expiration_hours(),
            refresh_ttl_days: JwtConfig::refresh_expiration_days(),
            api_key_prefix: ApiKeyConfig::prefix(),
        })
    }
}

/// API 키 설정
pub struct ApiKeyConfig;

impl ApiKeyConfig {
    /// API 키 접두사 (`{prefix}_{unixMillis}_{random}`)
    pub fn prefix() -> String {
        env::var("API_KEY_PREFIX").unwrap_or_else(|_| "mk".to_string())
    }
}

/// OAuth 플로우 및 외부 공급자 통신 설정
pub struct OAuthConfig;

impl OAuthConfig {
    /// 인증 코드 플로우의 `state` 서명 비밀키
    pub fn state_secret() -> AppResult<String> {
        signing_secret(
            "OAUTH_STATE_SECRET",
            env::var("OAUTH_STATE_SECRET").ok(),
            "oauth-state-secret",
            &Environment::current(),
        )
    }

    /// `state` 유효 기간 (분 단위, 기본 10분)
    pub fn session_timeout_minutes() -> i64 {
        env::var("OAUTH_SESSION_TIMEOUT_MINUTES")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10)
    }

    /// 외부 공급자 HTTP 호출 타임아웃 (기본 5초)
    pub fn http_timeout() -> Duration {
        let seconds = env::var("OAUTH_HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(5);
        Duration::from_secs(seconds)
    }

    /// 공개키 캐시 유지 시간 (기본 1시간)
    pub fn jwks_cache_ttl() -> Duration {
        let seconds = env::var("JWKS_CACHE_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(3600);
        Duration::from_secs(seconds)
    }
}

/// 서명 비밀키를 결정합니다.
///
/// 비어 있는 값은 없는 것으로 봅니다. 프로덕션에서는 공개된 기본값으로 서명할 수 없습니다.
fn signing_secret(
    name: &str,
    value: Option<String>,
    fallback: &str,
    environment: &Environment,
) -> AppResult<String> {
    match value.filter(|secret| !secret.trim().is_empty()) {
        Some(secret) => Ok(secret),
        None if environment.is_production() => {
            log::error!("{} not set in production", name);
            Err(AppError::InternalError(format!(
                "{} must be set in production",
                name
            )))
        }
        None => {
            log::warn!("{} not set, using development default", name);
            Ok(fallback.to_string())
        }
    }
}

/// 지원하는 인증 공급자
///
/// 사용자 레코드에 저장되는 값이며, 한 번 정해지면 바뀌지 않는 신뢰 바인딩입니다.
/// 로컬 계정만 외부 공급자 ID를 추가로 연결할 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// 이메일/비밀번호 인증
    Local,
    /// Google ID 토큰 인증
    Google,
    /// Sign in with Apple
    Apple,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
            AuthProvider::Apple => "apple",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_secret_uses_configured_value() {
        let secret = signing_secret(
            "JWT_SECRET",
            Some("configured".to_string()),
            "fallback",
            &Environment::Production,
        )
        .unwrap();
        assert_eq!(secret, "configured");
    }

    #[test]
    fn test_signing_secret_required_in_production() {
        for value in [None, Some("   ".to_string())] {
            let err = signing_secret("JWT_SECRET", value, "fallback", &Environment::Production)
                .unwrap_err();
            assert!(matches!(err, AppError::InternalError(msg) if msg.contains("JWT_SECRET")));
        }
    }

    #[test]
    fn test_signing_secret_falls_back_outside_production() {
        for environment in [Environment::Development, Environment::Test, Environment::Staging] {
            let secret =
                signing_secret("OAUTH_STATE_SECRET", None, "oauth-state-secret", &environment)
                    .unwrap();
            assert_eq!(secret, "oauth-state-secret");
        }
    }

    #[test]
    fn test_auth_provider_as_str() {
        assert_eq!(AuthProvider::Local.as_str(), "local");
        assert_eq!(AuthProvider::Google.as_str(), "google");
        assert_eq!(AuthProvider::Apple.as_str(), "apple");
    }

    #[test]
    fn test_auth_provider_serialization() {
        let json = serde_json::to_string(&AuthProvider::Apple).unwrap();
        assert_eq!(json, "\"apple\"");

        let deserialized: AuthProvider = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(deserialized, AuthProvider::Google);
    }
}
