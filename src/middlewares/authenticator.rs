//! # 요청 인증기
//!
//! `Authorization` 헤더(또는 `X-API-Key`)를 사용자 신원으로 바꾸는 순수 로직입니다.
//! actix 미들웨어([`AuthMiddleware`](super::AuthMiddleware))는 이 구조체를 호출만 합니다.
//!
//! ## 검증 전략
//!
//! 토큰은 우선순위가 정해진 전략 목록에 차례로 적용되고, 처음 성공한 전략이 이깁니다.
//!
//! | 순서 | 비밀키 | 신원 확인 | 비고 |
//! |------|--------|-----------|------|
//! | 1 | `JWT_SECRET` | `id` | 리프레시 토큰 거부 |
//! | 2 | `NEXTAUTH_SECRET` (설정 시) | `email`, 없으면 `id` | 연동 프론트엔드 세션 |
//!
//! 만료된 토큰은 다음 전략으로 넘기지 않고 바로 실패합니다.
//! 모든 실패는 외부에 `Unauthenticated` 하나로 보고되고, 원인은 로그에만 남습니다.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::config::JwtSettings;
use crate::core::{AppError, AppResult};
use crate::domain::entities::users::User;
use crate::domain::models::auth::{AuthMethod, AuthenticatedUser};
use crate::domain::models::token::{BearerClaims, TokenType};
use crate::repositories::users::UserStore;
use crate::services::auth::{extract_bearer_token, hash_api_key};
use crate::utils::normalize_email;

/// 검증된 클레임에서 사용자를 찾는 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityResolution {
    /// `id` 클레임으로만 조회
    ById,
    /// `email` 클레임이 있으면 이메일로, 없으면 `id`로 조회
    ByEmailThenId,
}

/// 하나의 비밀키와 그 비밀키로 서명된 토큰을 해석하는 규칙
pub struct VerificationStrategy {
    name: &'static str,
    method: AuthMethod,
    key: DecodingKey,
    validation: Validation,
    resolution: IdentityResolution,
    reject_refresh_tokens: bool,
}

impl VerificationStrategy {
    /// 서비스 자체 액세스 토큰 전략
    pub fn primary(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            name: "primary",
            method: AuthMethod::AccessToken,
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            resolution: IdentityResolution::ById,
            reject_refresh_tokens: true,
        }
    }

    /// 연동 프론트엔드 세션 토큰 전략
    ///
    /// 외부 시스템이 발급하므로 `exp`가 없을 수 있습니다. 있으면 검사합니다.
    pub fn secondary(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            name: "secondary",
            method: AuthMethod::SecondaryToken,
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            resolution: IdentityResolution::ByEmailThenId,
            reject_refresh_tokens: false,
        }
    }
}

enum StrategyOutcome {
    Verified(BearerClaims),
    Expired,
    Rejected,
}

pub struct Authenticator {
    strategies: Vec<VerificationStrategy>,
    store: Arc<dyn UserStore>,
}

impl Authenticator {
    pub fn new(strategies: Vec<VerificationStrategy>, store: Arc<dyn UserStore>) -> Self {
        Self { strategies, store }
    }

    /// JWT 설정으로 전략 목록을 구성합니다.
    ///
    /// 보조 비밀키가 없으면 기본 전략 하나만 사용합니다.
    pub fn from_settings(settings: &JwtSettings, store: Arc<dyn UserStore>) -> Self {
        let mut strategies = vec![VerificationStrategy::primary(&settings.secret)];
        if let Some(secondary) = settings.secondary_secret.as_deref() {
            strategies.push(VerificationStrategy::secondary(secondary));
        }
        Self::new(strategies, store)
    }

    /// 요청 헤더로 사용자를 인증합니다.
    ///
    /// `Authorization` 헤더가 있으면 그것만 사용하고, 없을 때만 `X-API-Key`를 확인합니다.
    pub async fn authenticate_request(
        &self,
        authorization: Option<&str>,
        api_key: Option<&str>,
    ) -> AppResult<AuthenticatedUser> {
        match (authorization, api_key) {
            (Some(_), _) => self.authenticate(authorization).await,
            (None, Some(key)) => self.authenticate_api_key(key).await,
            (None, None) => Err(AppError::Unauthenticated),
        }
    }

    /// `Authorization` 헤더 값을 사용자로 해석합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::Unauthenticated` - 헤더 없음, 형식 오류, 모든 전략 실패,
    ///   사용자 없음, 비활성 계정, 저장소 오류
    pub async fn authenticate(&self, authorization: Option<&str>) -> AppResult<AuthenticatedUser> {
        let Some(token) = authorization.and_then(extract_bearer_token) else {
            return Err(AppError::Unauthenticated);
        };

        for strategy in &self.strategies {
            match self.verify_with(strategy, token) {
                StrategyOutcome::Verified(claims) => {
                    let user = self.resolve(strategy, &claims).await?;
                    return Ok(AuthenticatedUser::new(user, strategy.method));
                }
                StrategyOutcome::Expired => {
                    log::debug!("{} 전략: 만료된 토큰", strategy.name);
                    return Err(AppError::Unauthenticated);
                }
                StrategyOutcome::Rejected => continue,
            }
        }

        log::debug!("모든 검증 전략 실패");
        Err(AppError::Unauthenticated)
    }

    /// `X-API-Key` 값을 사용자로 해석합니다.
    pub async fn authenticate_api_key(&self, api_key: &str) -> AppResult<AuthenticatedUser> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::Unauthenticated);
        }

        let user = self
            .store
            .find_by_api_key_hash(&hash_api_key(api_key))
            .await
            .map_err(|e| {
                log::error!("API 키 조회 실패: {}", e);
                AppError::Unauthenticated
            })?
            .ok_or(AppError::Unauthenticated)?;

        Self::ensure_active(user).map(|user| AuthenticatedUser::new(user, AuthMethod::ApiKey))
    }

    fn verify_with(&self, strategy: &VerificationStrategy, token: &str) -> StrategyOutcome {
        match decode::<BearerClaims>(token, &strategy.key, &strategy.validation) {
            Ok(data) => {
                let claims = data.claims;
                if strategy.reject_refresh_tokens && claims.token_type == Some(TokenType::Refresh) {
                    log::debug!("{} 전략: 리프레시 토큰으로 접근 시도", strategy.name);
                    return StrategyOutcome::Rejected;
                }
                StrategyOutcome::Verified(claims)
            }
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => StrategyOutcome::Expired,
            Err(e) => {
                log::trace!("{} 전략 검증 실패: {}", strategy.name, e);
                StrategyOutcome::Rejected
            }
        }
    }

    async fn resolve(
        &self,
        strategy: &VerificationStrategy,
        claims: &BearerClaims,
    ) -> AppResult<User> {
        let by_email = match (strategy.resolution, &claims.email) {
            (IdentityResolution::ByEmailThenId, Some(email)) => {
                Self::lookup(self.store.find_by_email(&normalize_email(email)).await)?
            }
            _ => None,
        };

        // 이메일로 찾지 못하면 id 클레임으로 재시도
        let user = match (by_email, &claims.id) {
            (Some(user), _) => user,
            (None, Some(id)) => Self::lookup(self.store.find_by_id(id).await)?.ok_or_else(|| {
                log::debug!("{} 전략: 토큰의 사용자를 찾을 수 없음", strategy.name);
                AppError::Unauthenticated
            })?,
            (None, None) => {
                log::debug!("{} 전략: 일치하는 신원 클레임 없음", strategy.name);
                return Err(AppError::Unauthenticated);
            }
        };

        Self::ensure_active(user)
    }

    fn lookup(result: AppResult<Option<User>>) -> AppResult<Option<User>> {
        result.map_err(|e| {
            log::error!("인증 중 사용자 조회 실패: {}", e);
            AppError::Unauthenticated
        })
    }

    fn ensure_active(user: User) -> AppResult<User> {
        if user.is_active {
            Ok(user)
        } else {
            log::info!("비활성 계정의 요청 거부 (id={})", user.id_string());
            Err(AppError::Unauthenticated)
        }
    }
}
