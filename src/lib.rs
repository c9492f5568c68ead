//! 다중 공급자 인증 서비스 백엔드
//!
//! 이메일/비밀번호, Google, Apple 로그인을 하나의 사용자 레코드로 통합하고
//! JWT 액세스/리프레시 토큰과 API 키로 요청을 인증합니다.
//!
//! # Features
//!
//! - **로컬 인증**: bcrypt 해시 기반 가입/로그인
//! - **외부 공급자**: Google/Apple ID 토큰을 공개키 집합(JWKS)으로 검증
//! - **계정 연결**: 공급자 ID 또는 이메일로 기존 계정을 찾아 연결
//! - **토큰 교체**: 사용자당 하나의 유효한 리프레시 토큰, 조건부 교체
//! - **API 키**: 해시로만 저장되는 장기 자격 증명
//! - **요청 한도**: 구독 등급별 고정 윈도우 (Redis)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP Routes   │ ← REST API 엔드포인트
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   Middlewares   │ ← 인증, 요청 한도
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Handlers     │ ← 요청/응답 처리
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Services     │ ← AuthService, TokenService, ID 토큰 검증기
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Repositories   │ ← UserStore (MongoDB / 메모리)
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prefs_auth_service::repositories::users::InMemoryUserStore;
//! use prefs_auth_service::services::auth::TokenService;
//!
//! let store = Arc::new(InMemoryUserStore::new());
//! let tokens = TokenService::new(JwtSettings::from_env()?, store.clone());
//! let pair = tokens.issue_token_pair(&user)?;
//! ```

pub mod caching;
pub mod config;
pub mod core;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod middlewares;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;
