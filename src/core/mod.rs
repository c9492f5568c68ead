//! # Core Module
//!
//! 서비스 전역에서 공유하는 핵심 타입을 제공합니다.
//!
//! - [`errors`]: `AppError`, `AppResult`, `ErrorContext`

pub mod errors;

pub use errors::{AppError, AppResult, ErrorContext};
