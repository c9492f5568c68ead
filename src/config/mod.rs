//! # Configuration Module
//!
//! 환경 변수 기반 설정을 제공합니다. `main`에서 `PROFILE`에 맞는 `.env` 파일을
//! 로드한 뒤, 각 설정 구조체의 정적 함수로 값을 읽습니다.
//!
//! - [`auth_config`]: JWT, Google/Apple, API 키, OAuth state 설정과 `AuthProvider`
//! - [`data_config`]: 실행 환경, bcrypt 비용, 서버 바인딩, 요청 한도

pub mod auth_config;
pub mod data_config;

pub use auth_config::*;
pub use data_config::*;
