//! # Google 인증 서비스
//!
//! Google 로그인은 두 경로로 들어옵니다.
//!
//! 1. **ID 토큰 직접 제출** (`POST /auth/google`): 프론트엔드가 Google Identity Services로
//!    받은 ID 토큰을 [`GoogleIdTokenVerifier`]가 검증합니다.
//! 2. **인증 코드 플로우** (`GET /auth/google/oauth` → `/auth/google/callback`):
//!    [`GoogleOAuthClient`]가 로그인 URL을 만들고, 콜백에서 코드를 ID 토큰으로
//!    교환합니다. 교환된 ID 토큰은 1번과 같은 검증을 거칩니다.
//!
//! ## OAuth 2.0 Authorization Code Flow
//!
//! ```text
//! 클라이언트                     우리 서버                         Google
//!     │ GET /auth/google/oauth       │                                │
//!     ├─────────────────────────────►│ state(JWT) 서명, URL 생성      │
//!     │ 302 → accounts.google.com    │                                │
//!     │◄─────────────────────────────┤                                │
//!     │ 사용자 인증 ────────────────────────────────────────────────────►│
//!     │ GET /auth/google/callback?code&state                          │
//!     ├─────────────────────────────►│ state 검증                     │
//!     │                              │ code → id_token 교환 ──────────►│
//!     │                              │◄────────────────────────────────┤
//!     │                              │ ID 토큰 검증, 사용자 확인/생성   │
//!     │ 302 → FRONTEND_URL + 쿠키     │                                │
//!     │◄─────────────────────────────┤                                │
//! ```
//!
//! ## CSRF 방지 (State Parameter)
//!
//! `state`는 `OAUTH_STATE_SECRET`으로 서명된 짧은 수명(기본 10분)의 HS256 JWT입니다.
//! 서버 측 저장소 없이도 위조와 만료를 검증할 수 있습니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::credential_verifier::IdTokenVerifier;
use super::jwks_client::{http_client, JwksClient};
use crate::config::{GoogleOAuthConfig, OAuthConfig};
use crate::core::{AppError, AppResult};
use crate::domain::dto::users::response::GoogleTokenResponse;
use crate::domain::models::oauth::{GoogleIdClaims, GoogleProfile};
use crate::utils::{clean_optional_string, normalize_email};

/// Google ID 토큰 검증기
///
/// 서명(Google JWKS), `aud`(클라이언트 ID), `iss`, `exp`를 확인하고
/// 이메일이 있는 토큰만 받아들입니다.
pub struct GoogleIdTokenVerifier {
    jwks: JwksClient,
    client_id: String,
    issuers: Vec<String>,
}

impl GoogleIdTokenVerifier {
    pub fn new(jwks: JwksClient, client_id: String, issuers: Vec<String>) -> Self {
        Self {
            jwks,
            client_id,
            issuers,
        }
    }

    /// 환경 변수 설정으로 생성합니다.
    pub fn from_env() -> AppResult<Self> {
        let jwks = JwksClient::new(
            "google",
            GoogleOAuthConfig::jwks_uri(),
            OAuthConfig::http_timeout(),
            OAuthConfig::jwks_cache_ttl(),
        )?;
        Ok(Self::new(
            jwks,
            GoogleOAuthConfig::client_id(),
            GoogleOAuthConfig::issuers(),
        ))
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleIdTokenVerifier {
    type Profile = GoogleProfile;

    async fn verify(&self, id_token: &str) -> AppResult<GoogleProfile> {
        let claims: GoogleIdClaims = self
            .jwks
            .verify(id_token, &self.client_id, &self.issuers)
            .await?;

        let Some(email) = clean_optional_string(claims.email) else {
            log::info!("Google ID 토큰에 이메일이 없습니다 (sub={})", claims.sub);
            return Err(AppError::InvalidToken);
        };

        Ok(GoogleProfile {
            sub: claims.sub,
            email: normalize_email(&email),
            name: clean_optional_string(claims.name),
            picture: clean_optional_string(claims.picture),
            email_verified: claims.email_verified.unwrap_or(false),
        })
    }
}

/// 인증 코드 플로우 설정
#[derive(Debug, Clone)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub state_secret: String,
    pub state_ttl_minutes: i64,
    pub http_timeout: Duration,
}

impl GoogleOAuthSettings {
    /// # Errors
    ///
    /// * `AppError::InternalError` - 프로덕션에서 `OAUTH_STATE_SECRET` 미설정
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            client_id: GoogleOAuthConfig::client_id(),
            client_secret: GoogleOAuthConfig::client_secret(),
            redirect_uri: GoogleOAuthConfig::redirect_uri(),
            auth_uri: GoogleOAuthConfig::auth_uri(),
            token_uri: GoogleOAuthConfig::token_uri(),
            state_secret: OAuthConfig::state_secret()?,
            state_ttl_minutes: OAuthConfig::session_timeout_minutes(),
            http_timeout: OAuthConfig::http_timeout(),
        })
    }
}

/// `state` 매개변수 클레임
#[derive(Debug, Serialize, Deserialize)]
struct OAuthState {
    nonce: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

const STATE_PURPOSE: &str = "google_oauth";

/// Google 인증 코드 플로우 클라이언트
pub struct GoogleOAuthClient {
    settings: GoogleOAuthSettings,
    http: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(settings: GoogleOAuthSettings) -> AppResult<Self> {
        let http = http_client(settings.http_timeout)?;

        Ok(Self { settings, http })
    }

    /// Google 로그인 페이지 URL 생성
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - `state`가 포함된 Google 인증 URL
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - `state` 서명 실패
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let url = oauth_client.login_url()?;
    /// // https://accounts.google.com/o/oauth2/v2/auth?client_id=...&state=eyJ...
    /// ```
    pub fn login_url(&self) -> AppResult<String> {
        let state = self.issue_state()?;

        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("scope", "openid email profile"),
            ("response_type", "code"),
            ("access_type", "online"),
            ("prompt", "select_account"),
            ("state", state.as_str()),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}?{}", self.settings.auth_uri, query_string))
    }

    /// 콜백으로 돌아온 `state`를 검증합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidToken` - 위조, 만료, 용도 불일치
    pub fn verify_state(&self, state: &str) -> AppResult<()> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<OAuthState>(
            state,
            &DecodingKey::from_secret(self.settings.state_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::warn!("OAuth state 검증 실패: {}", e);
            AppError::InvalidToken
        })?;

        if claims.purpose != STATE_PURPOSE {
            return Err(AppError::InvalidToken);
        }
        Ok(())
    }

    /// 인증 코드를 Google ID 토큰으로 교환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ExternalServiceError` - 요청 실패, 비정상 응답, `id_token` 누락
    pub async fn exchange_code(&self, auth_code: &str) -> AppResult<String> {
        let params = [
            ("code", auth_code),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.settings.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 토큰 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Google 토큰 교환 실패 ({}): {}", status, error_text);
            return Err(AppError::ExternalServiceError(format!(
                "Google 토큰 교환 실패: {}",
                status
            )));
        }

        let token_response = response.json::<GoogleTokenResponse>().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Google 토큰 응답 파싱 실패: {}", e))
        })?;

        token_response.id_token.ok_or_else(|| {
            AppError::ExternalServiceError("Google 토큰 응답에 id_token이 없습니다".to_string())
        })
    }

    fn issue_state(&self) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = OAuthState {
            nonce: Uuid::new_v4().to_string(),
            purpose: STATE_PURPOSE.to_string(),
            iat: now,
            exp: now + self.settings.state_ttl_minutes * 60,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.state_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalError(format!("OAuth state 생성 실패: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::test_support::{rsa_jwk, sign_rs256};
    use serde_json::json;

    fn verifier() -> GoogleIdTokenVerifier {
        GoogleIdTokenVerifier::new(
            JwksClient::with_keys("google", vec![rsa_jwk("g-kid")]),
            "google-client".to_string(),
            GoogleOAuthConfig::issuers(),
        )
    }

    fn id_token(payload: serde_json::Value) -> String {
        let mut claims = json!({
            "sub": "g1",
            "aud": "google-client",
            "iss": "https://accounts.google.com",
            "exp": Utc::now().timestamp() + 600,
        });
        if let (Some(base), Some(extra)) = (claims.as_object_mut(), payload.as_object()) {
            base.extend(extra.clone());
        }
        sign_rs256(&claims, "g-kid")
    }

    fn oauth_settings(ttl_minutes: i64) -> GoogleOAuthSettings {
        GoogleOAuthSettings {
            client_id: "google-client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:8080/api/v1/auth/google/callback".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "http://127.0.0.1:9/token".to_string(),
            state_secret: "state-secret".to_string(),
            state_ttl_minutes: ttl_minutes,
            http_timeout: Duration::from_millis(500),
        }
    }

    #[actix_web::test]
    async fn test_verify_extracts_profile() {
        let token = id_token(json!({
            "email": " B@X.com ",
            "email_verified": true,
            "name": "Bee",
            "picture": "https://example.com/p.png",
        }));

        let profile = verifier().verify(&token).await.unwrap();
        assert_eq!(profile.sub, "g1");
        assert_eq!(profile.email, "b@x.com");
        assert_eq!(profile.name.as_deref(), Some("Bee"));
        assert!(profile.email_verified);
    }

    #[actix_web::test]
    async fn test_verify_requires_email() {
        let token = id_token(json!({}));
        assert!(matches!(
            verifier().verify(&token).await,
            Err(AppError::InvalidToken)
        ));
    }

    #[actix_web::test]
    async fn test_verify_rejects_foreign_issuer() {
        let token = id_token(json!({ "email": "b@x.com", "iss": "https://evil.example" }));
        assert!(matches!(
            verifier().verify(&token).await,
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_login_url_carries_verifiable_state() {
        let client = GoogleOAuthClient::new(oauth_settings(10)).unwrap();
        let url = client.login_url().unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=google-client"));
        assert!(url.contains("scope=openid%20email%20profile"));

        let state = url
            .split('&')
            .find_map(|pair| pair.strip_prefix("state="))
            .unwrap();
        let state = urlencoding::decode(state).unwrap();
        assert!(client.verify_state(&state).is_ok());
    }

    #[test]
    fn test_state_rejects_tampered_and_expired() {
        let client = GoogleOAuthClient::new(oauth_settings(10)).unwrap();
        assert!(client.verify_state("").is_err());
        assert!(client.verify_state("not-a-state").is_err());

        let other = GoogleOAuthClient::new(GoogleOAuthSettings {
            state_secret: "different".to_string(),
            ..oauth_settings(10)
        })
        .unwrap();
        let foreign_state = other.issue_state().unwrap();
        assert!(client.verify_state(&foreign_state).is_err());

        let expired = GoogleOAuthClient::new(oauth_settings(-1)).unwrap();
        let stale_state = expired.issue_state().unwrap();
        assert!(expired.verify_state(&stale_state).is_err());
    }

    #[actix_web::test]
    async fn test_exchange_code_unreachable_is_external_error() {
        let client = GoogleOAuthClient::new(oauth_settings(10)).unwrap();
        assert!(matches!(
            client.exchange_code("code").await,
            Err(AppError::ExternalServiceError(_))
        ));
    }
}
