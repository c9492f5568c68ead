//! # Application Error Handling System
//!
//! 인증 서비스 전역에서 사용하는 통합 에러 타입입니다.
//! 모든 계층은 `AppResult<T>`를 반환하고, 핸들러에 도달한 `AppError`는
//! `actix_web::ResponseError` 구현을 통해 일관된 JSON 응답으로 변환됩니다.
//!
//! ## 인증 에러 분류
//!
//! 외부로 노출되는 인증 실패는 거친 범주로만 구분됩니다.
//! 어떤 검사가 실패했는지(이메일 없음, 비밀번호 불일치, 공급자 불일치 등)는
//! 서버 로그에만 남기고 클라이언트에는 동일한 메시지를 돌려줍니다.
//!
//! | AppError | HTTP Status | 사용 시나리오 |
//! |----------|-------------|---------------|
//! | `ValidationError` | 400 | 입력값 검증 실패 |
//! | `InvalidCredentials` | 401 | 이메일/비밀번호 불일치, 로컬 계정 아님 |
//! | `InvalidToken` | 401 | 외부 공급자 ID 토큰 검증 실패 |
//! | `ExpiredToken` | 401 | 액세스 토큰 만료 |
//! | `InvalidSignature` | 401 | 액세스 토큰 서명/형식 오류 |
//! | `InvalidRefreshToken` | 401 | 리프레시 토큰 교체 실패 (모든 원인 통합) |
//! | `Unauthenticated` | 401 | 미들웨어 인증 실패 (모든 원인 통합) |
//! | `AccountDeactivated` | 403 | 비활성화된 계정 |
//! | `NotFound` | 404 | 리소스 없음 |
//! | `AlreadyExists` | 409 | 이메일 중복 가입 |
//! | `ProviderConflict` | 409 | 다른 공급자에 바인딩된 이메일 |
//! | `TooManyRequests` | 429 | 요청 한도 초과 |
//! | `ExternalServiceError` | 502 | Google/Apple 등 외부 API 오류 |
//! | `DatabaseError` / `RedisError` / `InternalError` | 500 | 내부 오류 |
//!
//! ## 응답 형식
//!
//! ```json
//! {
//!   "success": false,
//!   "error": "invalid_credentials",
//!   "message": "이메일 또는 비밀번호가 올바르지 않습니다"
//! }
//! ```

use actix_web::http::StatusCode;
use thiserror::Error;

/// 애플리케이션 전역 에러 타입
///
/// 인프라 계층(`DatabaseError`, `RedisError`, `ExternalServiceError`),
/// 요청 계층(`ValidationError`, `NotFound`, `TooManyRequests`),
/// 인증 계층(나머지 변형)으로 나뉩니다.
///
/// 인증 계층 변형은 메시지를 담지 않습니다. 내부 원인은 발생 지점에서
/// 로그로 남기고, 에러 값 자체에는 외부에 보여줄 범주만 담습니다.
///
/// # 예제
///
/// ```rust,ignore
/// let user = store.find_by_email(&email).await?
///     .ok_or(AppError::InvalidCredentials)?;
///
/// collection.insert_one(&user).await
///     .map_err(|e| AppError::DatabaseError(e.to_string()))?;
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// MongoDB 연산 실패
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Redis 연산 실패
    #[error("Redis error: {0}")]
    RedisError(String),

    /// 입력값 검증 실패
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 리소스 없음
    ///
    /// 삭제되었거나 존재하지 않는 사용자 ID로 API 키를 발급하려는 경우 등에 사용합니다.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 잘못된 이메일/비밀번호 또는 로컬 계정이 아닌 경우
    ///
    /// 계정 존재 여부를 노출하지 않도록 모든 원인에 같은 메시지를 사용합니다.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// 이미 가입된 이메일
    #[error("Account already exists")]
    AlreadyExists,

    /// 자격 증명은 유효하지만 비활성화된 계정
    #[error("Account is deactivated")]
    AccountDeactivated,

    /// 이메일이 다른 외부 공급자 계정에 이미 바인딩됨
    #[error("Account is bound to a different sign-in provider")]
    ProviderConflict,

    /// 외부 공급자(Google/Apple) ID 토큰 검증 실패
    #[error("Invalid identity token")]
    InvalidToken,

    /// 액세스 토큰 만료
    #[error("Token expired")]
    ExpiredToken,

    /// 액세스 토큰 서명 불일치 또는 형식 오류
    #[error("Invalid token signature")]
    InvalidSignature,

    /// 리프레시 토큰 교체 실패
    ///
    /// 서명, 만료, 사용자 없음, 저장된 토큰 불일치, 비활성 계정 모두 이 변형으로 통합됩니다.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// 인증 미들웨어 실패
    #[error("Authentication required")]
    Unauthenticated,

    /// 요청 한도 초과, 재시도까지 남은 초를 담습니다.
    #[error("Too many requests, retry after {0} seconds")]
    TooManyRequests(u64),

    /// 외부 서비스 호출 실패 (공개키 조회 타임아웃, 토큰 교환 실패 등)
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 예상하지 못한 내부 오류
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 응답 본문의 `error` 필드에 들어가는 기계 판독용 코드
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "database_error",
            AppError::RedisError(_) => "cache_error",
            AppError::ValidationError(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AlreadyExists => "already_exists",
            AppError::AccountDeactivated => "account_deactivated",
            AppError::ProviderConflict => "provider_conflict",
            AppError::InvalidToken => "invalid_token",
            AppError::ExpiredToken => "token_expired",
            AppError::InvalidSignature => "invalid_signature",
            AppError::InvalidRefreshToken => "invalid_refresh_token",
            AppError::Unauthenticated => "authentication_required",
            AppError::TooManyRequests(_) => "too_many_requests",
            AppError::ExternalServiceError(_) => "external_service_error",
            AppError::InternalError(_) => "internal_error",
        }
    }

    /// 클라이언트에게 보여줄 메시지
    ///
    /// 5xx 계열은 내부 원인을 숨기고 고정 문구를 사용합니다.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidCredentials => "이메일 또는 비밀번호가 올바르지 않습니다".to_string(),
            AppError::AlreadyExists => "이미 가입된 이메일입니다".to_string(),
            AppError::AccountDeactivated => "비활성화된 계정입니다".to_string(),
            AppError::ProviderConflict => {
                "해당 이메일은 다른 로그인 방식으로 가입되어 있습니다".to_string()
            }
            AppError::InvalidToken => "유효하지 않은 ID 토큰입니다".to_string(),
            AppError::ExpiredToken => "토큰이 만료되었습니다".to_string(),
            AppError::InvalidSignature => "유효하지 않은 토큰입니다".to_string(),
            AppError::InvalidRefreshToken => "유효하지 않은 리프레시 토큰입니다".to_string(),
            AppError::Unauthenticated => "유효한 인증 토큰이 필요합니다".to_string(),
            AppError::TooManyRequests(_) => "요청이 너무 많습니다. 잠시 후 다시 시도해주세요".to_string(),
            AppError::ExternalServiceError(_) => "외부 인증 서비스에 연결할 수 없습니다".to_string(),
            AppError::DatabaseError(_) | AppError::RedisError(_) | AppError::InternalError(_) => {
                "서버 내부 오류가 발생했습니다".to_string()
            }
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::ExpiredToken
            | AppError::InvalidSignature
            | AppError::InvalidRefreshToken
            | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::AccountDeactivated => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists | AppError::ProviderConflict => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::RedisError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 각 변형을 상태 코드와 표준 JSON 본문으로 변환합니다.
    ///
    /// 5xx 에러는 여기서 원인을 로그로 남깁니다.
    fn error_response(&self) -> actix_web::HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!("요청 처리 중 서버 오류: {}", self);
        }

        let mut builder = actix_web::HttpResponse::build(status);
        if let AppError::TooManyRequests(retry_after) = self {
            builder.insert_header(("Retry-After", retry_after.to_string()));
        }

        builder.json(serde_json::json!({
            "success": false,
            "error": self.code(),
            "message": self.public_message(),
        }))
    }
}

/// `Result<T, AppError>` 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 외부 라이브러리 에러를 `AppError::InternalError`로 변환하는 확장 trait
///
/// ```rust,ignore
/// let hash = bcrypt::hash(plain, cost).context("비밀번호 해싱 실패")?;
/// ```
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> AppResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", msg, e)))
    }
}
