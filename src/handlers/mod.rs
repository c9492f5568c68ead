//! # HTTP 핸들러
//!
//! 요청을 DTO로 파싱하고, 서비스 계층을 호출한 뒤, 결과를 `ApiResponse`로 포장합니다.
//! 서비스는 `web::Data`로 주입받습니다.
//!
//! ```text
//! Client ──► Routes ──► Middlewares ──► Handlers ──► AuthService ──► UserStore
//! ```
//!
//! 에러는 `AppError`를 그대로 반환하면 `ResponseError` 구현이 상태 코드와
//! 표준 JSON 본문으로 변환합니다.

pub mod auth;
