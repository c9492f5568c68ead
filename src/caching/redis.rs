//! # Redis 클라이언트
//!
//! 요청 한도 카운터를 위한 Redis 연결을 제공합니다.
//! 멀티플렉싱 연결 하나로 여러 동시 요청을 처리합니다.

use std::env;

use redis::{AsyncCommands, Client};

use crate::core::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisClient {
    client: Client,
}

impl RedisClient {
    /// `REDIS_URL`로 연결하고 `PING`으로 가용성을 확인합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::RedisError` - URL 파싱 또는 연결 실패
    pub async fn new() -> AppResult<Self> {
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = Client::open(redis_url).map_err(|e| AppError::RedisError(e.to_string()))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))?;
        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))?;

        log::info!("✅ Redis 연결 성공");

        Ok(Self { client })
    }

    /// 키를 1 증가시키고, 새로 만들어진 키라면 만료 시간을 설정합니다.
    ///
    /// 현재 카운트와 남은 TTL(초)을 반환합니다.
    pub async fn incr_with_expiry(&self, key: &str, seconds: u64) -> Result<(u64, u64), redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let count: u64 = conn.incr(key, 1u64).await?;
        if count == 1 {
            let _: () = conn.expire(key, seconds as i64).await?;
        }

        let ttl: i64 = conn.ttl(key).await?;
        if ttl < 0 {
            // 만료가 빠진 키는 다시 설정
            let _: () = conn.expire(key, seconds as i64).await?;
            return Ok((count, seconds));
        }

        Ok((count, ttl as u64))
    }
}
