//! 요청 처리 중에만 존재하는 도메인 모델
//!
//! - [`auth`]: 인증 모드, 인증된 사용자 추출기
//! - [`token`]: JWT 클레임과 토큰 쌍
//! - [`oauth`]: 외부 공급자 ID 토큰 클레임, 검증된 프로필, JWKS

pub mod auth;
pub mod oauth;
pub mod token;
