//! 사용자 인증 응답 DTO

pub mod api_response;
pub mod google_oauth_response;
pub mod user_response;

pub use api_response::ApiResponse;
pub use google_oauth_response::GoogleTokenResponse;
pub use user_response::{ApiKeyResponse, AuthResponse, UserResponse};
