//! 사용자 인증 요청 DTO

pub mod auth_request;

pub use auth_request::{
    IdTokenRequest, LoginRequest, OAuthCallbackQuery, RefreshTokenRequest, RegisterRequest,
};
