//! 외부 공급자(Google/Apple) 관련 모델

pub mod federated_profile;
pub mod jwk;

pub use federated_profile::{AppleIdClaims, AppleProfile, GoogleIdClaims, GoogleProfile};
pub use jwk::{Jwk, JwkSet};
