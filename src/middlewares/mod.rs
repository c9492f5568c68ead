//! 미들웨어 모듈
//!
//! ActixWeb 요청 처리 파이프라인에서 사용되는 미들웨어와 그 핵심 로직을 제공합니다.
//!
//! # 제공 미들웨어
//!
//! ### 1. 인증 미들웨어 (AuthMiddleware)
//! - Bearer 토큰(기본/보조 비밀키) 또는 `X-API-Key` 검증
//! - 확인된 사용자를 request extension에 저장
//! - 필수/선택 인증 모드 지원
//!
//! ### 2. 요청 한도 미들웨어 (RateLimitMiddleware)
//! - 구독 등급별 고정 윈도우 한도
//! - 저장소 장애 시 요청 허용
//!
//! # 사용 방법
//!
//! 미들웨어는 등록 역순으로 실행됩니다. 인증이 먼저 실행되도록 마지막에 등록합니다.
//!
//! ```rust,ignore
//! use actix_web::{web, App};
//! use crate::middlewares::{AuthMiddleware, RateLimitMiddleware};
//!
//! App::new()
//!     .app_data(authenticator.clone())
//!     .app_data(rate_limiter.clone())
//!     .service(
//!         web::scope("/api/v1/auth")
//!             .wrap(RateLimitMiddleware)
//!             .wrap(AuthMiddleware::required())
//!             .service(me)
//!     )
//! ```

mod auth_inner;
pub mod auth_middleware;
pub mod authenticator;
pub mod rate_limit;

pub use auth_middleware::AuthMiddleware;
pub use authenticator::{Authenticator, IdentityResolution, VerificationStrategy};
pub use rate_limit::{RateDecision, RateLimitMiddleware, RateLimitPolicy, RateLimiter};
