//! # Sign in with Apple
//!
//! Apple ID 토큰을 Apple 공개키 집합(`https://appleid.apple.com/auth/keys`)으로
//! 서명 검증한 뒤 `sub`와 이메일을 추출합니다.
//!
//! Apple은 사용자가 처음 로그인할 때만 이메일을 보내고, 이후 토큰에서는 생략할 수 있습니다.
//! 이메일이 없는 토큰은 이미 연결된 계정(`apple_id`)을 찾을 때만 쓸 수 있습니다.

use async_trait::async_trait;

use super::credential_verifier::IdTokenVerifier;
use super::jwks_client::JwksClient;
use crate::config::{AppleConfig, OAuthConfig};
use crate::core::AppResult;
use crate::domain::models::oauth::{AppleIdClaims, AppleProfile};
use crate::utils::{clean_optional_string, normalize_email};

pub struct AppleIdTokenVerifier {
    jwks: JwksClient,
    client_id: String,
    issuers: Vec<String>,
}

impl AppleIdTokenVerifier {
    pub fn new(jwks: JwksClient, client_id: String, issuer: String) -> Self {
        Self {
            jwks,
            client_id,
            issuers: vec![issuer],
        }
    }

    pub fn from_env() -> AppResult<Self> {
        let jwks = JwksClient::new(
            "apple",
            AppleConfig::jwks_uri(),
            OAuthConfig::http_timeout(),
            OAuthConfig::jwks_cache_ttl(),
        )?;
        Ok(Self::new(jwks, AppleConfig::client_id(), AppleConfig::issuer()))
    }
}

#[async_trait]
impl IdTokenVerifier for AppleIdTokenVerifier {
    type Profile = AppleProfile;

    async fn verify(&self, id_token: &str) -> AppResult<AppleProfile> {
        let claims: AppleIdClaims = self
            .jwks
            .verify(id_token, &self.client_id, &self.issuers)
            .await?;

        Ok(AppleProfile {
            sub: claims.sub,
            email: clean_optional_string(claims.email).map(|email| normalize_email(&email)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AppError;
    use crate::services::auth::test_support::{rsa_jwk, sign_rs256};
    use serde_json::json;

    fn verifier() -> AppleIdTokenVerifier {
        AppleIdTokenVerifier::new(
            JwksClient::with_keys("apple", vec![rsa_jwk("a-kid")]),
            "com.example.prefs".to_string(),
            "https://appleid.apple.com".to_string(),
        )
    }

    #[actix_web::test]
    async fn test_verify_with_and_without_email() {
        let exp = chrono::Utc::now().timestamp() + 600;
        let with_email = sign_rs256(
            &json!({
                "sub": "a1",
                "email": "C@X.com",
                "aud": "com.example.prefs",
                "iss": "https://appleid.apple.com",
                "exp": exp,
            }),
            "a-kid",
        );
        let profile = verifier().verify(&with_email).await.unwrap();
        assert_eq!(profile.sub, "a1");
        assert_eq!(profile.email.as_deref(), Some("c@x.com"));

        let without_email = sign_rs256(
            &json!({
                "sub": "a1",
                "aud": "com.example.prefs",
                "iss": "https://appleid.apple.com",
                "exp": exp,
            }),
            "a-kid",
        );
        let profile = verifier().verify(&without_email).await.unwrap();
        assert!(profile.email.is_none());
    }

    #[actix_web::test]
    async fn test_unsigned_payload_is_rejected() {
        // 서명 없이 클레임만 맞춘 토큰
        let forged = "eyJhbGciOiJub25lIiwia2lkIjoiYS1raWQifQ.eyJzdWIiOiJhMSJ9.";
        assert!(matches!(
            verifier().verify(forged).await,
            Err(AppError::InvalidToken)
        ));
    }
}
