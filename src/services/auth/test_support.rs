//! 인증 서비스 테스트 도우미
//!
//! RS256 테스트 키, 고정 프로필을 돌려주는 가짜 검증기, 메모리 저장소 기반
//! 서비스 조립 함수를 제공합니다.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::Serialize;

use super::auth_service::AuthService;
use super::credential_verifier::IdTokenVerifier;
use super::token_service::TokenService;
use crate::config::JwtSettings;
use crate::core::{AppError, AppResult};
use crate::domain::models::oauth::{AppleProfile, GoogleProfile, Jwk};
use crate::repositories::users::InMemoryUserStore;

struct TestRsaKey {
    pem: String,
    n: String,
    e: String,
}

fn rsa_key() -> &'static TestRsaKey {
    static KEY: OnceLock<TestRsaKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rsa::rand_core::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("rsa key generation");
        let pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("pkcs1 pem")
            .to_string();

        TestRsaKey {
            pem,
            n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
        }
    })
}

/// 테스트 키의 공개키를 주어진 `kid`로 담은 JWK
pub fn rsa_jwk(kid: &str) -> Jwk {
    let key = rsa_key();
    Jwk {
        kid: kid.to_string(),
        kty: "RSA".to_string(),
        alg: Some("RS256".to_string()),
        key_use: Some("sig".to_string()),
        n: key.n.clone(),
        e: key.e.clone(),
    }
}

/// 테스트 키로 RS256 토큰 서명
pub fn sign_rs256<C: Serialize>(claims: &C, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(rsa_key().pem.as_bytes()).expect("rsa encoding key");
    encode(&header, claims, &key).expect("rs256 signing")
}

pub fn test_settings() -> JwtSettings {
    JwtSettings {
        secret: "test-primary-secret".to_string(),
        secondary_secret: Some("test-secondary-secret".to_string()),
        access_ttl_hours: 1,
        refresh_ttl_days: 7,
        api_key_prefix: "mk".to_string(),
    }
}

/// 토큰 문자열별로 미리 정해 둔 프로필을 돌려주는 검증기
pub struct StaticVerifier<P> {
    profiles: HashMap<String, P>,
}

impl<P> StaticVerifier<P> {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    pub fn with(mut self, id_token: &str, profile: P) -> Self {
        self.profiles.insert(id_token.to_string(), profile);
        self
    }
}

#[async_trait]
impl<P> IdTokenVerifier for StaticVerifier<P>
where
    P: Clone + Send + Sync + 'static,
{
    type Profile = P;

    async fn verify(&self, id_token: &str) -> AppResult<P> {
        self.profiles
            .get(id_token)
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

pub fn google_profile(sub: &str, email: &str) -> GoogleProfile {
    GoogleProfile {
        sub: sub.to_string(),
        email: email.to_string(),
        name: Some("Bee".to_string()),
        picture: Some("https://example.com/bee.png".to_string()),
        email_verified: true,
    }
}

pub fn apple_profile(sub: &str, email: Option<&str>) -> AppleProfile {
    AppleProfile {
        sub: sub.to_string(),
        email: email.map(str::to_string),
    }
}

/// 메모리 저장소와 가짜 검증기로 조립한 인증 서비스
pub struct TestHarness {
    pub store: Arc<InMemoryUserStore>,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
}

pub fn harness(
    google: StaticVerifier<GoogleProfile>,
    apple: StaticVerifier<AppleProfile>,
) -> TestHarness {
    let store = Arc::new(InMemoryUserStore::new());
    let tokens = Arc::new(TokenService::new(test_settings(), store.clone()));
    let auth = AuthService::new(
        store.clone(),
        tokens.clone(),
        Arc::new(google),
        Arc::new(apple),
        4,
    );

    TestHarness {
        store,
        tokens,
        auth,
    }
}
