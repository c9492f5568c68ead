//! # Domain Layer
//!
//! - [`entities`]: 영속화되는 사용자 엔티티와 부분 갱신 집합
//! - [`dto`]: HTTP 요청/응답 구조체
//! - [`models`]: 토큰 클레임, 외부 공급자 프로필, 인증 컨텍스트

pub mod dto;
pub mod entities;
pub mod models;

pub use models::*;
