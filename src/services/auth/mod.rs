//! 인증 및 보안 서비스 모듈
//!
//! 자격 증명 검증, 토큰 발급/교체, 외부 공급자(Google/Apple) 로그인,
//! 그리고 이들을 조합하는 인증 오케스트레이터를 제공합니다.
//!
//! # Security
//!
//! - 서비스 자체 토큰은 HMAC-SHA256 서명
//! - 외부 공급자 ID 토큰은 공급자 JWKS로 RS256 서명 검증
//! - CSRF 방지 (서명된 OAuth state 매개변수)
//! - 사용자당 하나의 유효한 리프레시 토큰
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::services::auth::AuthService;
//!
//! let result = auth_service.google_sign_in(&id_token).await?;
//! println!("new user: {}", result.is_new_user);
//! ```

pub mod apple_auth_service;
pub mod auth_service;
pub mod credential_verifier;
pub mod google_auth_service;
pub mod jwks_client;
pub mod token_service;

#[cfg(test)]
pub mod test_support;

pub use apple_auth_service::AppleIdTokenVerifier;
pub use auth_service::{AuthResult, AuthService};
pub use credential_verifier::{hash_password, verify_password, IdTokenVerifier};
pub use google_auth_service::{GoogleIdTokenVerifier, GoogleOAuthClient, GoogleOAuthSettings};
pub use jwks_client::JwksClient;
pub use token_service::{extract_bearer_token, hash_api_key, TokenService};
