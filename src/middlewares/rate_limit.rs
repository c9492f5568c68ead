//! # 요청 한도 미들웨어
//!
//! 보호된 스코프에서 인증 미들웨어 안쪽에 배치되어, 구독 등급별 고정 윈도우
//! 한도를 적용합니다.
//!
//! | 호출자 | 카운터 키 | 기본 한도 (5분) |
//! |--------|-----------|-----------------|
//! | free | `user:{id}` | 5 |
//! | basic | `user:{id}` | 50 |
//! | premium | `user:{id}` | 500 |
//! | 익명 | `ip:{addr}` | 10 |
//!
//! 한도를 넘으면 `Retry-After`와 함께 429를 반환합니다.
//! 카운터 저장소가 실패하면 요청을 막지 않고 로그만 남깁니다.
//!
//! 프로세스 전체 버스트 보호는 `main`의 `actix-governor`가 담당합니다.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{web, Error, HttpMessage, ResponseError};
use futures_util::future::LocalBoxFuture;

use crate::caching::CounterStore;
use crate::config::RateLimitConfig;
use crate::core::{AppError, AppResult};
use crate::domain::entities::users::SubscriptionTier;
use crate::domain::models::auth::AuthenticatedUser;

/// 등급별 한도 정책
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub anonymous: u32,
    pub free: u32,
    pub basic: u32,
    pub premium: u32,
}

impl RateLimitPolicy {
    pub fn from_env() -> Self {
        Self {
            window: Duration::from_secs(RateLimitConfig::window_seconds()),
            anonymous: RateLimitConfig::anonymous_limit(),
            free: RateLimitConfig::free_limit(),
            basic: RateLimitConfig::basic_limit(),
            premium: RateLimitConfig::premium_limit(),
        }
    }

    pub fn limit_for(&self, tier: Option<SubscriptionTier>) -> u32 {
        match tier {
            Some(SubscriptionTier::Free) => self.free,
            Some(SubscriptionTier::Basic) => self.basic,
            Some(SubscriptionTier::Premium) => self.premium,
            None => self.anonymous,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(300),
            anonymous: 10,
            free: 5,
            basic: 50,
            premium: 500,
        }
    }
}

/// 한 요청에 대한 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_in: Duration,
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    /// 호출자의 카운터를 증가시키고 허용 여부를 판정합니다.
    ///
    /// # Arguments
    ///
    /// * `user` - 인증된 호출자 (없으면 익명)
    /// * `peer` - 익명 호출자의 주소
    ///
    /// # Errors
    ///
    /// 카운터 저장소 오류를 그대로 돌려줍니다. 미들웨어는 이를 허용으로 처리합니다.
    pub async fn check(
        &self,
        user: Option<&AuthenticatedUser>,
        peer: &str,
    ) -> AppResult<RateDecision> {
        let (key, limit) = match user {
            Some(current) => (
                format!("user:{}", current.user_id()),
                self.policy.limit_for(Some(current.user.subscription)),
            ),
            None => (format!("ip:{}", peer), self.policy.limit_for(None)),
        };

        let hit = self.store.hit(&key, self.policy.window).await?;
        let count = u32::try_from(hit.count).unwrap_or(u32::MAX);

        Ok(RateDecision {
            allowed: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_in: hit.reset_in,
        })
    }
}

/// 요청 한도 미들웨어
///
/// `RateLimiter`는 `App::app_data(web::Data<RateLimiter>)`로 등록되어 있어야 합니다.
/// 등록되지 않았으면 한도를 적용하지 않습니다.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, actix_web::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let Some(limiter) = req.app_data::<web::Data<RateLimiter>>().cloned() else {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            };

            let user = req.extensions().get::<AuthenticatedUser>().cloned();
            let peer = req
                .connection_info()
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string();

            let decision = match limiter.check(user.as_ref(), &peer).await {
                Ok(decision) => Some(decision),
                Err(e) => {
                    log::warn!("요청 한도 확인 실패, 요청 허용: {}", e);
                    None
                }
            };

            if let Some(decision) = decision.filter(|decision| !decision.allowed) {
                log::info!(
                    "요청 한도 초과: {} (limit={})",
                    user.as_ref().map(|u| u.user_id()).unwrap_or(peer),
                    decision.limit
                );
                let retry_after = decision.reset_in.as_secs().max(1);
                let mut response = AppError::TooManyRequests(retry_after).error_response();
                set_limit_headers(response.headers_mut(), &decision);
                let (req, _) = req.into_parts();
                return Ok(ServiceResponse::new(req, response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            if let Some(decision) = decision {
                set_limit_headers(res.headers_mut(), &decision);
            }
            Ok(res.map_into_left_body())
        })
    }
}

fn set_limit_headers(headers: &mut actix_web::http::header::HeaderMap, decision: &RateDecision) {
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
}
