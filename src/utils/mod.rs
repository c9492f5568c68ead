//! 공통 유틸리티

pub mod string_utils;

pub use string_utils::*;
