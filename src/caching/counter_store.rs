//! # 고정 윈도우 카운터 저장소
//!
//! 요청 한도 미들웨어가 사용하는 키 단위 카운터입니다.
//! 카운터는 첫 증가 시점부터 `window` 동안 유지되고, 만료되면 0부터 다시 셉니다.
//!
//! - [`RedisCounterStore`]: 여러 서버 인스턴스가 공유하는 운영용 구현
//! - [`InMemoryCounterStore`]: 단일 프로세스/테스트용 구현

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::redis::RedisClient;
use crate::core::{AppError, AppResult};

/// 카운터 증가 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// 현재 윈도우에서 이번 요청을 포함한 누적 횟수
    pub count: u64,
    /// 윈도우가 초기화되기까지 남은 시간
    pub reset_in: Duration,
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// `key`의 카운터를 1 증가시킵니다.
    async fn hit(&self, key: &str, window: Duration) -> AppResult<WindowHit>;
}

pub struct RedisCounterStore {
    redis: Arc<RedisClient>,
    namespace: String,
}

impl RedisCounterStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self {
            redis,
            namespace: "ratelimit".to_string(),
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hit(&self, key: &str, window: Duration) -> AppResult<WindowHit> {
        let redis_key = format!("{}:{}", self.namespace, key);
        let seconds = window.as_secs().max(1);

        let (count, ttl) = self
            .redis
            .incr_with_expiry(&redis_key, seconds)
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))?;

        Ok(WindowHit {
            count,
            reset_in: Duration::from_secs(ttl),
        })
    }
}

struct Window {
    count: u64,
    started_at: Instant,
}

#[derive(Default)]
pub struct InMemoryCounterStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn hit(&self, key: &str, window: Duration) -> AppResult<WindowHit> {
        let mut windows = self.windows.lock();
        let now = Instant::now();

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });
        if now.duration_since(entry.started_at) >= window {
            entry.count = 0;
            entry.started_at = now;
        }
        entry.count += 1;

        Ok(WindowHit {
            count: entry.count,
            reset_in: window.saturating_sub(now.duration_since(entry.started_at)),
        })
    }
}
