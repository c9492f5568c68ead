//! # JWKS 공개키 캐시
//!
//! Google/Apple 같은 OpenID 공급자의 공개키 집합을 내려받아 일정 시간 캐시하고,
//! RS256 ID 토큰의 서명과 표준 클레임을 검증합니다.
//!
//! ## 동작
//!
//! 1. 토큰 헤더의 `kid`로 캐시를 조회합니다.
//! 2. 캐시가 만료되었거나 `kid`가 없으면 공급자에서 한 번 다시 받아옵니다
//!    (공급자 키 교체 직후의 토큰을 받아들이기 위함).
//! 3. 그래도 없으면 `InvalidToken`입니다.
//!
//! 네트워크 호출에는 항상 타임아웃이 걸려 있고, 조회 실패는 `ExternalServiceError`로 보고합니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::core::{AppError, AppResult, ErrorContext};
use crate::domain::models::oauth::{Jwk, JwkSet};

/// 타임아웃이 걸린 외부 공급자용 HTTP 클라이언트
///
/// 타임아웃 없는 기본 클라이언트로 대체하지 않고 생성 실패를 그대로 보고합니다.
pub(crate) fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("HTTP 클라이언트 생성 실패")
}

struct CachedKeys {
    keys: HashMap<String, Jwk>,
    fetched_at: Instant,
}

pub struct JwksClient {
    provider: &'static str,
    jwks_uri: Option<String>,
    http: reqwest::Client,
    ttl: Duration,
    cache: RwLock<Option<CachedKeys>>,
}

impl JwksClient {
    /// 원격 JWKS 주소를 사용하는 클라이언트를 만듭니다.
    ///
    /// # Arguments
    ///
    /// * `provider` - 로그용 공급자 이름 (`"google"`, `"apple"`)
    /// * `jwks_uri` - 공개키 집합 URL
    /// * `timeout` - HTTP 요청 타임아웃
    /// * `ttl` - 캐시 유지 시간
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - HTTP 클라이언트 생성 실패
    pub fn new(
        provider: &'static str,
        jwks_uri: String,
        timeout: Duration,
        ttl: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            provider,
            jwks_uri: Some(jwks_uri),
            http: http_client(timeout)?,
            ttl,
            cache: RwLock::new(None),
        })
    }

    /// 고정된 키 집합만 사용하는 클라이언트를 만듭니다. 네트워크를 사용하지 않습니다.
    pub fn with_keys(provider: &'static str, keys: Vec<Jwk>) -> Self {
        let keys = keys.into_iter().map(|jwk| (jwk.kid.clone(), jwk)).collect();

        Self {
            provider,
            jwks_uri: None,
            http: reqwest::Client::new(),
            ttl: Duration::MAX,
            cache: RwLock::new(Some(CachedKeys {
                keys,
                fetched_at: Instant::now(),
            })),
        }
    }

    /// RS256 ID 토큰을 검증하고 클레임을 역직렬화합니다.
    ///
    /// # Arguments
    ///
    /// * `audience` - 기대하는 `aud` (공급자에 등록된 클라이언트 ID)
    /// * `issuers` - 허용하는 `iss` 값 목록
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidToken` - 헤더/서명/`aud`/`iss`/`exp` 불일치, 알 수 없는 `kid`
    /// * `AppError::ExternalServiceError` - 공개키 조회 실패
    pub async fn verify<C: DeserializeOwned>(
        &self,
        token: &str,
        audience: &str,
        issuers: &[String],
    ) -> AppResult<C> {
        if audience.is_empty() {
            log::warn!("{} 클라이언트 ID가 설정되지 않아 ID 토큰을 거부합니다", self.provider);
            return Err(AppError::InvalidToken);
        }

        let header = decode_header(token).map_err(|e| {
            log::debug!("{} ID 토큰 헤더 해석 실패: {}", self.provider, e);
            AppError::InvalidToken
        })?;
        if header.alg != Algorithm::RS256 {
            log::debug!("{} ID 토큰 알고리즘 거부: {:?}", self.provider, header.alg);
            return Err(AppError::InvalidToken);
        }
        let kid = header.kid.ok_or(AppError::InvalidToken)?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(issuers);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        decode::<C>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("{} ID 토큰 검증 실패: {}", self.provider, e);
                AppError::InvalidToken
            })
    }

    /// `kid`에 해당하는 공개키를 찾습니다. 필요하면 한 번 다시 받아옵니다.
    pub async fn decoding_key(&self, kid: &str) -> AppResult<DecodingKey> {
        if let Some(jwk) = self.cached(kid, true) {
            return to_decoding_key(&jwk);
        }

        if self.jwks_uri.is_none() {
            return Err(AppError::InvalidToken);
        }

        self.refresh().await?;

        match self.cached(kid, false) {
            Some(jwk) => to_decoding_key(&jwk),
            None => {
                log::debug!("{} 공개키 집합에 kid={} 없음", self.provider, kid);
                Err(AppError::InvalidToken)
            }
        }
    }

    fn cached(&self, kid: &str, require_fresh: bool) -> Option<Jwk> {
        let cache = self.cache.read();
        let cached = cache.as_ref()?;
        if require_fresh && cached.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        cached.keys.get(kid).cloned()
    }

    async fn refresh(&self) -> AppResult<()> {
        let Some(uri) = self.jwks_uri.as_deref() else {
            return Ok(());
        };

        let response = self
            .http
            .get(uri)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                log::error!("{} 공개키 조회 실패: {}", self.provider, e);
                AppError::ExternalServiceError(format!("{} 공개키 조회 실패", self.provider))
            })?;

        let set = response.json::<JwkSet>().await.map_err(|e| {
            log::error!("{} 공개키 응답 파싱 실패: {}", self.provider, e);
            AppError::ExternalServiceError(format!("{} 공개키 응답 파싱 실패", self.provider))
        })?;

        log::debug!("{} 공개키 {}개 갱신", self.provider, set.keys.len());

        *self.cache.write() = Some(CachedKeys {
            keys: set.keys.into_iter().map(|jwk| (jwk.kid.clone(), jwk)).collect(),
            fetched_at: Instant::now(),
        });
        Ok(())
    }
}

fn to_decoding_key(jwk: &Jwk) -> AppResult<DecodingKey> {
    if jwk.kty != "RSA" {
        return Err(AppError::InvalidToken);
    }
    DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
        log::warn!("공개키 kid={} 변환 실패: {}", jwk.kid, e);
        AppError::InvalidToken
    })
}
