//! 데이터 및 서버 설정 관리 모듈
//!
//! 실행 환경, 비밀번호 해싱 비용, 서버 바인딩, 요청 한도 설정을 관리합니다.

use std::env;

/// 애플리케이션 실행 환경
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 개발 환경
    Development,
    /// 테스트 환경
    Test,
    /// 스테이징 환경
    Staging,
    /// 프로덕션 환경
    Production,
}

impl Environment {
    /// 현재 실행 환경을 감지합니다.
    ///
    /// `ENVIRONMENT` 또는 `NODE_ENV` 환경 변수를 확인하며,
    /// 설정되지 않은 경우 `Production`을 기본값으로 사용합니다.
    pub fn current() -> Self {
        let value = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| env::var("NODE_ENV").unwrap_or_else(|_| "production".to_string()));
        Self::from_str(&value)
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "test" | "testing" => Environment::Test,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Production,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// 비밀번호 해싱 설정
pub struct PasswordConfig;

impl PasswordConfig {
    /// bcrypt 비용 인자를 반환합니다.
    ///
    /// `BCRYPT_COST`가 4~15 범위로 설정되어 있으면 그 값을, 아니면 환경별 기본값을 사용합니다.
    ///
    /// | 환경 | 비용 |
    /// |------|------|
    /// | Development / Test | 4 |
    /// | Staging | 10 |
    /// | Production | 12 |
    pub fn bcrypt_cost() -> u32 {
        if let Ok(cost_str) = env::var("BCRYPT_COST") {
            if let Ok(cost) = cost_str.parse::<u32>() {
                if (4..=15).contains(&cost) {
                    return cost;
                }
            }
            log::warn!("BCRYPT_COST 값이 올바르지 않습니다: {}", cost_str);
        }

        Self::bcrypt_cost_for_env(&Environment::current())
    }

    pub fn bcrypt_cost_for_env(env: &Environment) -> u32 {
        match env {
            Environment::Development => 4,
            Environment::Test => 4,
            Environment::Staging => 10,
            Environment::Production => 12,
        }
    }
}

/// HTTP 서버 설정
pub struct ServerConfig;

impl ServerConfig {
    pub fn port() -> u16 {
        env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080)
    }

    pub fn host() -> String {
        env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
    }

    /// OAuth 콜백 이후 리다이렉트할 프론트엔드 주소
    pub fn frontend_url() -> String {
        env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// 쉼표로 구분된 CORS 허용 Origin 목록
    pub fn cors_allowed_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

/// 요청 한도 설정
///
/// 전역 버스트 보호(`actix-governor`)와 구독 등급별 고정 윈도우 한도를 함께 다룹니다.
pub struct RateLimitConfig;

impl RateLimitConfig {
    pub fn per_second() -> u64 {
        parse_env("RATE_LIMIT_PER_SECOND", 100)
    }

    pub fn burst_size() -> u32 {
        parse_env("RATE_LIMIT_BURST_SIZE", 200)
    }

    /// 고정 윈도우 길이 (초, 기본 5분)
    pub fn window_seconds() -> u64 {
        parse_env("RATE_LIMIT_WINDOW_SECONDS", 300)
    }

    pub fn anonymous_limit() -> u32 {
        parse_env("RATE_LIMIT_ANONYMOUS", 10)
    }

    pub fn free_limit() -> u32 {
        parse_env("RATE_LIMIT_FREE", 5)
    }

    pub fn basic_limit() -> u32 {
        parse_env("RATE_LIMIT_BASIC", 50)
    }

    pub fn premium_limit() -> u32 {
        parse_env("RATE_LIMIT_PREMIUM", 500)
    }
}

fn parse_env<T: std::str::FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.parse::<T>().unwrap_or_else(|_| {
            log::error!("{} 파싱 실패: {}. 기본값 {} 사용", key, value, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_string() {
        assert_eq!(Environment::from_str("development"), Environment::Development);
        assert_eq!(Environment::from_str("dev"), Environment::Development);
        assert_eq!(Environment::from_str("test"), Environment::Test);
        assert_eq!(Environment::from_str("production"), Environment::Production);
        assert_eq!(Environment::from_str("unknown"), Environment::Production);
    }

    #[test]
    fn test_bcrypt_cost_for_each_environment() {
        assert_eq!(PasswordConfig::bcrypt_cost_for_env(&Environment::Development), 4);
        assert_eq!(PasswordConfig::bcrypt_cost_for_env(&Environment::Test), 4);
        assert_eq!(PasswordConfig::bcrypt_cost_for_env(&Environment::Staging), 10);
        assert_eq!(PasswordConfig::bcrypt_cost_for_env(&Environment::Production), 12);
    }

    #[test]
    fn test_server_config_defaults() {
        if env::var("PORT").is_err() {
            assert_eq!(ServerConfig::port(), 8080);
        }

        if env::var("FRONTEND_URL").is_err() {
            assert_eq!(ServerConfig::frontend_url(), "http://localhost:3000");
        }
    }

    #[test]
    fn test_parse_env_falls_back_on_garbage() {
        // 테스트 전용 키라 다른 테스트와 충돌하지 않습니다.
        unsafe { env::set_var("PREFS_AUTH_TEST_PARSE_ENV", "not-a-number") };
        assert_eq!(parse_env::<u32>("PREFS_AUTH_TEST_PARSE_ENV", 7), 7);
        assert_eq!(parse_env::<u32>("PREFS_AUTH_TEST_PARSE_ENV_MISSING", 3), 3);
    }
}
