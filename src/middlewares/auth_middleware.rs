//! JWT 인증 미들웨어
//!
//! ActixWeb 요청 파이프라인에서 [`Authenticator`](super::Authenticator)로 요청을 인증하고,
//! 확인된 사용자를 request extension에 [`AuthenticatedUser`](crate::domain::models::auth::AuthenticatedUser)로 저장합니다.
//!
//! `Authenticator`는 `App::app_data(web::Data<Authenticator>)`로 등록되어 있어야 합니다.

use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, Result,
};

use crate::domain::models::auth::AuthMode;
use crate::middlewares::auth_inner::AuthMiddlewareService;

/// JWT 인증 미들웨어
pub struct AuthMiddleware {
    /// 인증 모드 (Required/Optional)
    mode: AuthMode,
}

impl AuthMiddleware {
    pub fn new(mode: AuthMode) -> Self {
        Self { mode }
    }

    /// 필수 인증 미들웨어 생성. 인증 실패 시 401을 반환합니다.
    pub fn required() -> Self {
        Self::new(AuthMode::Required)
    }

    /// 선택적 인증 미들웨어 생성. 인증 실패 시 사용자 없이 요청을 진행합니다.
    pub fn optional() -> Self {
        Self::new(AuthMode::Optional)
    }
}

/// ActixWeb Transform trait 구현
impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            mode: self.mode,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    use super::*;
    use crate::domain::entities::users::User;
    use crate::domain::models::auth::{AuthenticatedUser, OptionalUser};
    use crate::middlewares::Authenticator;
    use crate::repositories::users::{InMemoryUserStore, UserStore};
    use crate::services::auth::test_support::test_settings;
    use crate::services::auth::TokenService;

    async fn whoami(current: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(current.user.email)
    }

    async fn maybe(current: OptionalUser) -> HttpResponse {
        match current.0 {
            Some(user) => HttpResponse::Ok().body(user.user.email),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn setup() -> (web::Data<Authenticator>, TokenService, User) {
        let store = Arc::new(InMemoryUserStore::new());
        let user = store
            .create(User::new_local("a@x.com".into(), "Ann".into(), "hash".into()))
            .await
            .unwrap();
        let tokens = TokenService::new(test_settings(), store.clone());
        let authenticator = web::Data::new(Authenticator::from_settings(&test_settings(), store));
        (authenticator, tokens, user)
    }

    #[actix_web::test]
    async fn test_required_mode_blocks_and_allows() {
        let (authenticator, tokens, user) = setup().await;
        let app = test::init_service(
            App::new().app_data(authenticator).service(
                web::scope("/protected")
                    .wrap(AuthMiddleware::required())
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/protected/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "authentication_required");

        let token = tokens.issue_access_token(&user).unwrap();
        let req = test::TestRequest::get()
            .uri("/protected/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "a@x.com");
    }

    #[actix_web::test]
    async fn test_required_mode_accepts_api_key() {
        let (authenticator, tokens, user) = setup().await;
        let key = tokens.generate_api_key(&user.id_string()).await.unwrap();
        let app = test::init_service(
            App::new().app_data(authenticator).service(
                web::scope("/protected")
                    .wrap(AuthMiddleware::required())
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/protected/me")
            .insert_header(("X-API-Key", key))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_optional_mode_never_blocks() {
        let (authenticator, tokens, user) = setup().await;
        let app = test::init_service(
            App::new().app_data(authenticator).service(
                web::scope("/open")
                    .wrap(AuthMiddleware::optional())
                    .route("/who", web::get().to(maybe)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/open/who")
            .insert_header(("Authorization", "Bearer junk"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(test::read_body(res).await, "anonymous");

        let token = tokens.issue_access_token(&user).unwrap();
        let req = test::TestRequest::get()
            .uri("/open/who")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(test::read_body(res).await, "a@x.com");
    }

    #[actix_web::test]
    async fn test_extractor_without_middleware_is_unauthorized() {
        let app = test::init_service(App::new().route("/me", web::get().to(whoami))).await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
