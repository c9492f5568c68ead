//! 데이터 액세스 계층

pub mod users;
