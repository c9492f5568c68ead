//! 캐싱 계층 모듈
//!
//! Redis 연결과, 그 위에 구현된 고정 윈도우 카운터 저장소를 제공합니다.
//!
//! # 환경 설정
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379  # 기본값
//! ```

pub mod counter_store;
pub mod redis;

pub use counter_store::{CounterStore, InMemoryCounterStore, RedisCounterStore, WindowHit};
pub use redis::RedisClient;
