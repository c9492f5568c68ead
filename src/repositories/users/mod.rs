//! 사용자 저장소
//!
//! - [`user_store`]: 인증 코어가 의존하는 `UserStore` trait
//! - [`user_repo`]: MongoDB 구현
//! - [`memory_store`]: 메모리 구현

pub mod memory_store;
pub mod user_repo;
pub mod user_store;

pub use memory_store::InMemoryUserStore;
pub use user_repo::MongoUserStore;
pub use user_store::UserStore;
