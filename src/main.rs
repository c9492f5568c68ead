//! 인증 서비스 메인 애플리케이션
//!
//! MongoDB, Redis 연결과 모든 서비스를 조립한 뒤 Actix-web HTTP 서버를 구동합니다.
//! 서비스는 생성 시점에 명시적으로 연결되고 `web::Data`로 핸들러에 주입됩니다.

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};

use prefs_auth_service::caching::{RedisClient, RedisCounterStore};
use prefs_auth_service::config::{JwtSettings, PasswordConfig, RateLimitConfig, ServerConfig};
use prefs_auth_service::core::AppError;
use prefs_auth_service::db::Database;
use prefs_auth_service::middlewares::{Authenticator, RateLimitPolicy, RateLimiter};
use prefs_auth_service::repositories::users::{MongoUserStore, UserStore};
use prefs_auth_service::routes::configure_all_routes;
use prefs_auth_service::services::auth::{
    AppleIdTokenVerifier, AuthService, GoogleIdTokenVerifier, GoogleOAuthClient,
    GoogleOAuthSettings, TokenService,
};

/// 핸들러와 미들웨어에 주입되는 공유 상태
#[derive(Clone)]
struct AppState {
    auth: web::Data<AuthService>,
    authenticator: web::Data<Authenticator>,
    rate_limiter: web::Data<RateLimiter>,
    google_oauth: web::Data<GoogleOAuthClient>,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    load_env_file();
    init_logging();

    info!("🚀 인증 서비스 시작중...");

    let state = build_state().await.map_err(|e| {
        error!("서비스 초기화 실패: {}", e);
        io::Error::other(e.to_string())
    })?;

    info!("✅ 모든 서비스가 성공적으로 초기화되었습니다!");

    start_http_server(state).await
}

/// 저장소 연결과 서비스 그래프를 조립합니다
///
/// # Errors
///
/// * `AppError::DatabaseError` - MongoDB 연결 또는 인덱스 생성 실패
/// * `AppError::RedisError` - Redis 연결 실패
/// * `AppError::InternalError` - 프로덕션 서명 비밀키 누락, HTTP 클라이언트 생성 실패
async fn build_state() -> Result<AppState, AppError> {
    info!("📡 데이터베이스 연결 중...");

    let database = Database::new().await?;
    let store: Arc<dyn UserStore> = Arc::new(MongoUserStore::new(&database).await?);

    let redis = Arc::new(RedisClient::new().await?);
    let counters = Arc::new(RedisCounterStore::new(redis));

    let jwt_settings = JwtSettings::from_env()?;
    if jwt_settings.secondary_secret.is_none() {
        info!("보조 토큰 비밀키가 설정되지 않아 기본 토큰만 허용합니다");
    }

    let tokens = Arc::new(TokenService::new(jwt_settings.clone(), store.clone()));
    let auth = AuthService::new(
        store.clone(),
        tokens,
        Arc::new(GoogleIdTokenVerifier::from_env()?),
        Arc::new(AppleIdTokenVerifier::from_env()?),
        PasswordConfig::bcrypt_cost(),
    );

    let google_oauth = GoogleOAuthClient::new(GoogleOAuthSettings::from_env()?)?;

    Ok(AppState {
        auth: web::Data::new(auth),
        authenticator: web::Data::new(Authenticator::from_settings(&jwt_settings, store)),
        rate_limiter: web::Data::new(RateLimiter::new(counters, RateLimitPolicy::from_env())),
        google_oauth: web::Data::new(google_oauth),
    })
}

/// HTTP 서버를 구성하고 실행합니다
///
/// # Errors
///
/// * `std::io::Error` - 요청 한도 설정 오류, 포트 바인딩 실패 또는 서버 실행 오류
async fn start_http_server(state: AppState) -> io::Result<()> {
    let bind_address = (ServerConfig::host(), ServerConfig::port());

    info!("🌐 서버가 http://{}:{} 에서 실행중입니다", bind_address.0, bind_address.1);
    info!("📍 Health check: http://{}:{}/health", bind_address.0, bind_address.1);

    let per_second = RateLimitConfig::per_second();
    let burst_size = RateLimitConfig::burst_size();
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_second(per_second)
        .burst_size(burst_size)
        .use_headers()
        .finish()
        .ok_or_else(|| {
            error!("잘못된 요청 한도 설정: 초당 {}, 버스트 {}", per_second, burst_size);
            io::Error::new(io::ErrorKind::InvalidInput, "invalid rate limit configuration")
        })?;

    info!(
        "🛡️ Rate Limiting 활성화: 초당 {}요청, 버스트 {}개",
        per_second, burst_size
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.auth.clone())
            .app_data(state.authenticator.clone())
            .app_data(state.rate_limiter.clone())
            .app_data(state.google_oauth.clone())
            .wrap(Governor::new(&governor_conf))
            .wrap(configure_cors())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_all_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}

/// 환경별 설정 파일을 로드합니다
///
/// * `PROFILE=dev` - `.env.dev` (기본값)
/// * `PROFILE=prod` - `.env.prod`
/// * 기타 - `.env`
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    let loaded = match profile.as_str() {
        "prod" => dotenv::from_filename(".env.prod").map(|_| ".env.prod"),
        "dev" => dotenv::from_filename(".env.dev").map(|_| ".env.dev"),
        _ => dotenv().map(|_| ".env"),
    };

    // 로거 초기화 전이므로 결과는 표준 에러로 출력
    match loaded {
        Ok(file) => eprintln!("[{}] {} 파일 로드 됨", profile, file),
        Err(e) => eprintln!("[{}] 환경 파일 로드 실패, 프로세스 환경변수 사용: {}", profile, e),
    }
}

/// `RUST_LOG` 기반 로깅 초기화 (기본값: `info,actix_web=debug`)
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info,actix_web=debug"));
}

/// `CORS_ALLOWED_ORIGINS`에 나열된 Origin만 허용하는 CORS 설정
///
/// 세션 쿠키를 주고받으므로 자격 증명을 허용합니다.
fn configure_cors() -> Cors {
    let cors = ServerConfig::cors_allowed_origins()
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin));

    cors.allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
        .expose_headers(vec![
            header::RETRY_AFTER,
            header::HeaderName::from_static("x-ratelimit-limit"),
            header::HeaderName::from_static("x-ratelimit-remaining"),
        ])
        .supports_credentials()
        .max_age(3600)
}
