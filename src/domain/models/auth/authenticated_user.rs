//! 인증된 사용자 추출기
//!
//! 인증 미들웨어가 확인한 사용자를 핸들러에 타입으로 전달합니다.
//! 핸들러는 `AuthenticatedUser`(필수) 또는 `OptionalUser`(선택)를 인자로 받으면 됩니다.
//!
//! ```rust,ignore
//! #[get("/me")]
//! async fn me(current: AuthenticatedUser) -> Result<HttpResponse, AppError> {
//!     Ok(HttpResponse::Ok().json(UserResponse::from(&current.user)))
//! }
//! ```

use std::future::{ready, Ready};

use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};

use crate::core::AppError;
use crate::domain::entities::users::User;
use crate::domain::models::auth::authentication_request::AuthMethod;

/// 미들웨어가 확인한 사용자와 인증 수단
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub method: AuthMethod,
}

impl AuthenticatedUser {
    pub fn new(user: User, method: AuthMethod) -> Self {
        Self { user, method }
    }

    pub fn user_id(&self) -> String {
        self.user.id_string()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(AppError::Unauthenticated.into())),
        }
    }
}

/// 선택적 인증 라우트용 추출기. 인증되지 않았으면 `None`입니다.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl FromRequest for OptionalUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        ready(Ok(OptionalUser(user)))
    }
}
