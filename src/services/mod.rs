//! 비즈니스 로직을 담당하는 서비스 계층 모듈
//!
//! 서비스는 `main`에서 한 번 조립되어 `Arc`로 공유되고, 핸들러에는
//! `web::Data`로 주입됩니다. 저장소와 외부 검증기는 trait 객체로 받으므로
//! 테스트에서는 메모리 구현과 가짜 검증기로 바꿔 끼울 수 있습니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! let store: Arc<dyn UserStore> = Arc::new(MongoUserStore::new(&database).await?);
//! let tokens = Arc::new(TokenService::new(JwtSettings::from_env()?, store.clone()));
//! ```

pub mod auth;
