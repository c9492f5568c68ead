//! HTTP 요청/응답 데이터 전송 객체

pub mod users;

pub use users::*;
