//! JSON Web Key Set (RFC 7517)

use serde::{Deserialize, Serialize};

/// RSA 공개키 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    pub kid: String,
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// base64url 인코딩된 모듈러스
    pub n: String,
    /// base64url 인코딩된 공개 지수
    pub e: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}
