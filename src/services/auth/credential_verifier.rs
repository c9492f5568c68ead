//! # 자격 증명 검증
//!
//! 신뢰할 수 없는 원시 자격 증명(비밀번호, 외부 공급자 ID 토큰)을
//! 검증된 값으로 바꾸는 계층입니다. 부수 효과가 없고, 실패해도 재시도하지 않습니다.
//!
//! bcrypt는 CPU를 오래 점유하므로 항상 `web::block`으로 블로킹 스레드 풀에서 실행합니다.

use actix_web::web;
use async_trait::async_trait;

use crate::core::{AppResult, ErrorContext};

/// 평문 비밀번호를 bcrypt로 해싱합니다.
///
/// # Arguments
///
/// * `plain` - 평문 비밀번호
/// * `cost` - bcrypt 비용 인자 (`PasswordConfig::bcrypt_cost()`)
///
/// # Errors
///
/// * `AppError::InternalError` - 해싱 실패 또는 블로킹 풀 오류
pub async fn hash_password(plain: &str, cost: u32) -> AppResult<String> {
    let plain = plain.to_string();

    web::block(move || bcrypt::hash(plain, cost))
        .await
        .context("블로킹 작업 실패")?
        .context("비밀번호 해싱 실패")
}

/// 평문 비밀번호를 저장된 해시와 비교합니다.
///
/// 불일치, 해시 없음, 손상된 해시 모두 `false`입니다. 에러를 던지지 않습니다.
pub async fn verify_password(plain: &str, stored_hash: Option<&str>) -> bool {
    let Some(hash) = stored_hash else {
        return false;
    };
    let plain = plain.to_string();
    let hash = hash.to_string();

    match web::block(move || bcrypt::verify(plain, &hash)).await {
        Ok(Ok(matched)) => matched,
        Ok(Err(e)) => {
            log::warn!("저장된 비밀번호 해시를 해석할 수 없습니다: {}", e);
            false
        }
        Err(e) => {
            log::error!("비밀번호 검증 작업 실패: {}", e);
            false
        }
    }
}

/// 외부 공급자 ID 토큰 검증기
///
/// 구현체는 서명, `aud`, `iss`, `exp`를 모두 확인한 뒤 공급자별 프로필을 돌려줍니다.
///
/// # Errors
///
/// * `AppError::InvalidToken` - 형식, 서명, 클레임 불일치
/// * `AppError::ExternalServiceError` - 공개키 조회 실패 또는 타임아웃
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    type Profile: Send;

    async fn verify(&self, id_token: &str) -> AppResult<Self::Profile>;
}
