//! 인증 HTTP 핸들러
//!
//! 모든 엔드포인트는 `/api/v1/auth` 아래에 있습니다.
//!
//! # 공개 엔드포인트
//!
//! - `POST /register`, `POST /login` - 이메일/비밀번호
//! - `POST /google`, `POST /apple` - 외부 공급자 ID 토큰
//! - `POST /refresh` - 리프레시 토큰 교체 (본문 또는 `refreshToken` 쿠키)
//! - `GET /google/oauth`, `GET /google/callback` - Google 인증 코드 플로우
//!
//! # 보호된 엔드포인트
//!
//! - `POST /logout`, `GET /me`
//! - `POST /api-key` (`POST /api-key/generate`), `DELETE /api-key`
//!
//! 보호된 핸들러는 라우트 매크로 없이 정의되고, `routes`에서 인증 미들웨어와 함께
//! 리소스 단위로 등록됩니다.
//!
//! 핸들러는 요청 파싱과 응답 포장만 담당하고, 로직은 [`AuthService`]에 위임합니다.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::config::{Environment, ServerConfig};
use crate::core::{AppError, AppResult};
use crate::domain::dto::users::request::{
    IdTokenRequest, LoginRequest, OAuthCallbackQuery, RefreshTokenRequest, RegisterRequest,
};
use crate::domain::dto::users::response::{ApiKeyResponse, ApiResponse, AuthResponse};
use crate::domain::models::auth::AuthenticatedUser;
use crate::domain::models::token::TokenPair;
use crate::services::auth::{AuthService, GoogleOAuthClient};

const ACCESS_COOKIE: &str = "accessToken";
const REFRESH_COOKIE: &str = "refreshToken";

/// 이메일/비밀번호 회원가입
///
/// # Endpoint
/// `POST /api/v1/auth/register`
///
/// 성공 시 201과 함께 사용자 정보와 토큰 쌍을 반환합니다.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let result = auth.register(payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        AuthResponse::from(result),
        "회원가입이 완료되었습니다",
    )))
}

/// 이메일/비밀번호 로그인
///
/// # Endpoint
/// `POST /api/v1/auth/login`
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let result = auth.login(payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(AuthResponse::from(result))))
}

/// Google ID 토큰 로그인
///
/// # Endpoint
/// `POST /api/v1/auth/google`
///
/// ```bash
/// curl -X POST http://localhost:8080/api/v1/auth/google \
///   -H "Content-Type: application/json" \
///   -d '{"idToken":"eyJhbGciOiJSUzI1NiIs..."}'
/// ```
#[post("/google")]
pub async fn google_sign_in(
    auth: web::Data<AuthService>,
    payload: web::Json<IdTokenRequest>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let result = auth.google_sign_in(&payload.id_token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(result.into_federated_response())))
}

/// Apple ID 토큰 로그인
///
/// # Endpoint
/// `POST /api/v1/auth/apple`
#[post("/apple")]
pub async fn apple_sign_in(
    auth: web::Data<AuthService>,
    payload: web::Json<IdTokenRequest>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let result = auth.apple_sign_in(&payload.id_token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(result.into_federated_response())))
}

/// 토큰 갱신
///
/// 요청 본문의 `refreshToken`을 먼저 보고, 없으면 같은 이름의 쿠키를 사용합니다.
///
/// # Endpoint
/// `POST /api/v1/auth/refresh`
#[post("/refresh")]
pub async fn refresh(
    auth: web::Data<AuthService>,
    req: HttpRequest,
    body: Option<web::Json<RefreshTokenRequest>>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = extract_refresh_token(&req, body.as_deref())?;
    let tokens: TokenPair = auth.refresh_tokens(&refresh_token).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(tokens)))
}

/// Google 인증 코드 플로우 시작
///
/// # Endpoint
/// `GET /api/v1/auth/google/oauth`
///
/// Google 로그인 페이지로 302 리다이렉트합니다.
#[get("/google/oauth")]
pub async fn google_oauth(oauth: web::Data<GoogleOAuthClient>) -> Result<HttpResponse, AppError> {
    let url = oauth.login_url()?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, url))
        .finish())
}

/// Google 인증 코드 플로우 콜백
///
/// # Endpoint
/// `GET /api/v1/auth/google/callback?code={code}&state={state}`
///
/// 성공하면 세션 쿠키를 설정하고 `FRONTEND_URL/auth/callback`으로, 실패하면
/// `FRONTEND_URL/login?error={code}`로 리다이렉트합니다. 에러 응답을 직접 돌려주지 않습니다.
#[get("/google/callback")]
pub async fn google_callback(
    auth: web::Data<AuthService>,
    oauth: web::Data<GoogleOAuthClient>,
    query: web::Query<OAuthCallbackQuery>,
) -> HttpResponse {
    let frontend_url = ServerConfig::frontend_url();

    match complete_google_callback(&auth, &oauth, &query).await {
        Ok(tokens) => {
            let secure = Environment::current().is_production();

            HttpResponse::Found()
                .insert_header((header::LOCATION, format!("{}/auth/callback", frontend_url)))
                .cookie(session_cookie(
                    ACCESS_COOKIE,
                    tokens.access_token,
                    CookieDuration::minutes(15),
                    secure,
                ))
                .cookie(session_cookie(
                    REFRESH_COOKIE,
                    tokens.refresh_token,
                    CookieDuration::days(30),
                    secure,
                ))
                .finish()
        }
        Err(e) => {
            log::warn!("Google OAuth 콜백 실패: {}", e);
            HttpResponse::Found()
                .insert_header((
                    header::LOCATION,
                    format!(
                        "{}/login?error={}",
                        frontend_url,
                        urlencoding::encode(e.code())
                    ),
                ))
                .finish()
        }
    }
}

async fn complete_google_callback(
    auth: &AuthService,
    oauth: &GoogleOAuthClient,
    query: &OAuthCallbackQuery,
) -> AppResult<TokenPair> {
    if let Some(error) = &query.error {
        let description = query.error_description.as_deref().unwrap_or("");
        return Err(AppError::ValidationError(format!(
            "Google OAuth 거부: {} {}",
            error, description
        )));
    }

    let state = query
        .state
        .as_deref()
        .filter(|state| !state.is_empty())
        .ok_or(AppError::InvalidToken)?;
    oauth.verify_state(state)?;

    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::ValidationError("인증 코드가 없습니다".to_string()))?;

    let id_token = oauth.exchange_code(code).await?;
    let result = auth.google_sign_in(&id_token).await?;

    log::info!(
        "Google OAuth 로그인 성공 (id={}, new={})",
        result.user.id_string(),
        result.is_new_user
    );
    Ok(result.tokens)
}

/// 로그아웃
///
/// # Endpoint
/// `POST /api/v1/auth/logout`
pub async fn logout(
    auth: web::Data<AuthService>,
    current: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    auth.logout(&current.user_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("로그아웃되었습니다")))
}

/// 현재 사용자 정보
///
/// # Endpoint
/// `GET /api/v1/auth/me`
pub async fn me(
    auth: web::Data<AuthService>,
    current: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = auth.me(&current.user_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(user)))
}

/// API 키 발급
///
/// 원문 키는 이 응답에서 한 번만 볼 수 있습니다. 기존 키는 무효화됩니다.
///
/// # Endpoint
/// `POST /api/v1/auth/api-key`, `POST /api/v1/auth/api-key/generate`
pub async fn generate_api_key(
    auth: web::Data<AuthService>,
    current: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let api_key = auth.generate_api_key(&current.user_id()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// API 키 폐기
///
/// # Endpoint
/// `DELETE /api/v1/auth/api-key`
pub async fn revoke_api_key(
    auth: web::Data<AuthService>,
    current: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    auth.revoke_api_key(&current.user_id()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::message("API 키가 폐기되었습니다")))
}

/// 요청 본문 또는 쿠키에서 리프레시 토큰 추출
fn extract_refresh_token(
    req: &HttpRequest,
    body: Option<&RefreshTokenRequest>,
) -> AppResult<String> {
    if let Some(body) = body.filter(|body| !body.refresh_token.trim().is_empty()) {
        return Ok(body.refresh_token.trim().to_string());
    }

    req.cookie(REFRESH_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(AppError::InvalidRefreshToken)
}

fn session_cookie(
    name: &'static str,
    value: String,
    max_age: CookieDuration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_refresh_token_prefers_body_over_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_COOKIE, "from-cookie"))
            .to_http_request();
        let body = RefreshTokenRequest {
            refresh_token: "from-body".to_string(),
        };

        assert_eq!(extract_refresh_token(&req, Some(&body)).unwrap(), "from-body");
        assert_eq!(extract_refresh_token(&req, None).unwrap(), "from-cookie");
    }

    #[test]
    fn test_missing_refresh_token_is_rejected() {
        let req = TestRequest::default().to_http_request();
        let empty = RefreshTokenRequest {
            refresh_token: "  ".to_string(),
        };

        assert!(matches!(
            extract_refresh_token(&req, Some(&empty)),
            Err(AppError::InvalidRefreshToken)
        ));
        assert!(matches!(
            extract_refresh_token(&req, None),
            Err(AppError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn test_session_cookie_is_http_only() {
        let cookie = session_cookie(
            REFRESH_COOKIE,
            "value".to_string(),
            CookieDuration::days(30),
            false,
        );

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(30)));
    }
}
