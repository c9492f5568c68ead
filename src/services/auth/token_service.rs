//! JWT 토큰 관리 서비스 구현
//!
//! 서비스 자체 비밀키(HS256)로 액세스/리프레시 토큰을 발급하고 검증하며,
//! 리프레시 토큰 교체와 API 키 발급/폐기를 담당합니다.
//!
//! ## 토큰 상태
//!
//! ```text
//! ISSUED ──► ACTIVE ──► EXPIRED
//!    │
//!    └──► REVOKED (로그아웃, 교체로 덮어쓰기)
//! ```
//!
//! 별도의 세션 테이블은 없습니다. 액세스 토큰의 유효성은 서명과 `exp`로,
//! 리프레시 토큰의 유효성은 여기에 더해 사용자 레코드에 저장된 단 하나의
//! 리프레시 토큰과의 정확한 문자열 일치로 판정합니다.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::core::{AppError, AppResult};
use crate::domain::entities::users::{User, UserChanges};
use crate::domain::models::token::{AccessClaims, RefreshClaims, TokenPair, TokenType};
use crate::repositories::users::UserStore;
use crate::utils::to_base36;

/// API 키 무작위 부분 길이 (base36 문자 수)
const API_KEY_RANDOM_LEN: u32 = 13;

/// JWT 토큰 관리 서비스
///
/// HMAC-SHA256 서명을 사용합니다. 액세스 토큰은 기본 1시간,
/// 리프레시 토큰은 기본 7일 동안 유효합니다.
pub struct TokenService {
    settings: JwtSettings,
    store: Arc<dyn UserStore>,
}

impl TokenService {
    pub fn new(settings: JwtSettings, store: Arc<dyn UserStore>) -> Self {
        Self { settings, store }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// 액세스 토큰 유효 시간(초)
    pub fn access_ttl_seconds(&self) -> i64 {
        self.settings.access_ttl_hours * 3600
    }

    /// 사용자를 위한 JWT 액세스 토큰 생성
    ///
    /// `{id, email, subscription, exp}`에 `iat`, `jti`, `token_type = "access"`를 더해 서명합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - 토큰 서명 실패
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let access_token = token_service.issue_access_token(&user)?;
    /// ```
    pub fn issue_access_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.settings.access_ttl_hours);

        let claims = AccessClaims {
            id: user.id_string(),
            email: user.email.clone(),
            subscription: user.subscription,
            token_type: TokenType::Access,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key())
            .map_err(|e| AppError::InternalError(format!("JWT 토큰 생성 실패: {}", e)))
    }

    /// 사용자를 위한 리프레시 토큰 생성
    ///
    /// 서명만 하고 저장하지는 않습니다. 저장(이전 토큰 덮어쓰기)은 호출자가
    /// 다른 변경과 함께 하나의 갱신으로 수행합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - 토큰 서명 실패
    pub fn issue_refresh_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now + Duration::days(self.settings.refresh_ttl_days);

        let claims = RefreshClaims {
            id: user.id_string(),
            token_type: TokenType::Refresh,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key())
            .map_err(|e| AppError::InternalError(format!("리프레시 토큰 생성 실패: {}", e)))
    }

    /// 토큰 쌍 생성 (액세스 + 리프레시)
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let pair = token_service.issue_token_pair(&user)?;
    /// println!("Expires in: {} seconds", pair.expires_in);
    /// ```
    pub fn issue_token_pair(&self, user: &User) -> AppResult<TokenPair> {
        let access_token = self.issue_access_token(user)?;
        let refresh_token = self.issue_refresh_token(user)?;

        Ok(TokenPair::bearer(
            access_token,
            refresh_token,
            self.access_ttl_seconds(),
        ))
    }

    /// 액세스 토큰 검증 및 클레임 추출
    ///
    /// # Errors
    ///
    /// * `AppError::ExpiredToken` - 만료
    /// * `AppError::InvalidSignature` - 서명 불일치, 형식 오류, 리프레시 토큰 사용
    pub fn verify_access_token(&self, token: &str) -> AppResult<AccessClaims> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key(), &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidSignature,
            })?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::InvalidSignature);
        }
        Ok(claims)
    }

    /// 리프레시 토큰의 서명과 만료를 검증합니다.
    ///
    /// 어떤 이유로 실패하든 `AppError::InvalidRefreshToken` 하나로 보고합니다.
    pub fn verify_refresh_claims(&self, token: &str) -> AppResult<RefreshClaims> {
        let claims = decode::<RefreshClaims>(token, &self.decoding_key(), &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("리프레시 토큰 검증 실패: {}", e);
                AppError::InvalidRefreshToken
            })?;

        if claims.token_type != TokenType::Refresh {
            return Err(AppError::InvalidRefreshToken);
        }
        Ok(claims)
    }

    /// 리프레시 토큰 교체
    ///
    /// 서명/만료 검증, 사용자 조회, 저장된 토큰과의 정확한 일치, 활성 상태를
    /// 모두 확인한 뒤 새 토큰 쌍을 발급하고 조건부 갱신으로 저장합니다.
    /// 같은 토큰으로 동시에 두 번 교체를 시도하면 하나만 성공합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidRefreshToken` - 모든 검증 실패 (원인은 로그에만 남김)
    /// * `AppError::DatabaseError` - 저장소 I/O 실패
    pub async fn rotate(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.verify_refresh_claims(refresh_token)?;

        let user = match self.store.find_by_id(&claims.id).await? {
            Some(user) => user,
            None => {
                log::info!("리프레시 거부: 사용자 없음 (id={})", claims.id);
                return Err(AppError::InvalidRefreshToken);
            }
        };

        if user.refresh_token.as_deref() != Some(refresh_token) {
            log::info!("리프레시 거부: 저장된 토큰과 불일치 (id={})", claims.id);
            return Err(AppError::InvalidRefreshToken);
        }
        if !user.is_active {
            log::info!("리프레시 거부: 비활성 계정 (id={})", claims.id);
            return Err(AppError::InvalidRefreshToken);
        }

        let pair = self.issue_token_pair(&user)?;

        let replaced = self
            .store
            .replace_refresh_token(&claims.id, refresh_token, &pair.refresh_token)
            .await?;
        if !replaced {
            log::info!("리프레시 거부: 동시 교체에서 밀림 (id={})", claims.id);
            return Err(AppError::InvalidRefreshToken);
        }

        Ok(pair)
    }

    /// 새 API 키를 발급하고 다이제스트를 저장합니다. 기존 키는 덮어씁니다.
    ///
    /// 키 형식은 `{prefix}_{unixMillis}_{base36}`이며, 평문은 이 반환값으로만 전달됩니다.
    ///
    /// # Errors
    ///
    /// * `AppError::NotFound` - 사용자 없음
    pub async fn generate_api_key(&self, user_id: &str) -> AppResult<String> {
        let api_key = format!(
            "{}_{}_{}",
            self.settings.api_key_prefix,
            Utc::now().timestamp_millis(),
            random_base36()
        );

        let changes = UserChanges {
            api_key_hash: Some(Some(hash_api_key(&api_key))),
            ..UserChanges::default()
        };

        match self.store.update(user_id, changes).await? {
            Some(_) => {
                log::info!("API 키 발급 (user_id={})", user_id);
                Ok(api_key)
            }
            None => Err(AppError::NotFound(format!("사용자를 찾을 수 없습니다: {}", user_id))),
        }
    }

    /// API 키 폐기. 키가 없거나 사용자가 없어도 성공합니다.
    pub async fn revoke_api_key(&self, user_id: &str) -> AppResult<()> {
        let changes = UserChanges {
            api_key_hash: Some(None),
            ..UserChanges::default()
        };

        if self.store.update(user_id, changes).await?.is_none() {
            log::debug!("API 키 폐기 대상 사용자 없음 (user_id={})", user_id);
        }
        Ok(())
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.settings.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.settings.secret.as_bytes())
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }
}

/// API 키의 저장용 다이제스트 (SHA-256, 소문자 16진수)
pub fn hash_api_key(api_key: &str) -> String {
    format!("{:x}", Sha256::digest(api_key.as_bytes()))
}

/// HTTP Authorization 헤더의 "Bearer {token}" 형식에서 토큰 부분만을 추출합니다.
///
/// 접두사가 다르거나 토큰이 비어 있으면 `None`입니다.
///
/// # Examples
///
/// ```rust,ignore
/// assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
/// assert_eq!(extract_bearer_token("Basic abc"), None);
/// ```
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn random_base36() -> String {
    let modulus = 36u128.pow(API_KEY_RANDOM_LEN);
    let encoded = to_base36(Uuid::new_v4().as_u128() % modulus);
    format!("{:0>width$}", encoded, width = API_KEY_RANDOM_LEN as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::users::InMemoryUserStore;
    use crate::services::auth::test_support::test_settings;

    fn service() -> (TokenService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        (TokenService::new(test_settings(), store.clone()), store)
    }

    async fn stored_user(store: &InMemoryUserStore, refresh_token: Option<&str>) -> User {
        let mut user = User::new_local("a@x.com".into(), "Ann".into(), "hash".into());
        user.refresh_token = refresh_token.map(str::to_string);
        store.create(user).await.unwrap()
    }

    #[test]
    fn test_access_token_round_trip() {
        let (service, _) = service();
        let user = User::new_local("a@x.com".into(), "Ann".into(), "hash".into());

        let token = service.issue_access_token(&user).unwrap();
        let claims = service.verify_access_token(&token).unwrap();

        assert_eq!(claims.id, user.id_string());
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_pairs_issued_together_are_distinct() {
        let (service, _) = service();
        let user = User::new_local("a@x.com".into(), "Ann".into(), "hash".into());

        let first = service.issue_token_pair(&user).unwrap();
        let second = service.issue_token_pair(&user).unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(first.expires_in, 3600);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let (service, _) = service();
        let user = User::new_local("a@x.com".into(), "Ann".into(), "hash".into());

        let refresh = service.issue_refresh_token(&user).unwrap();
        assert!(matches!(
            service.verify_access_token(&refresh),
            Err(AppError::InvalidSignature)
        ));

        let access = service.issue_access_token(&user).unwrap();
        assert!(matches!(
            service.verify_refresh_claims(&access),
            Err(AppError::InvalidRefreshToken)
        ));
    }

    #[test]
    fn test_verify_access_token_errors() {
        let (service, _) = service();
        let user = User::new_local("a@x.com".into(), "Ann".into(), "hash".into());

        let expired = AccessClaims {
            id: user.id_string(),
            email: user.email.clone(),
            subscription: user.subscription,
            token_type: TokenType::Access,
            jti: "j".into(),
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(&Header::default(), &expired, &service.encoding_key()).unwrap();
        assert!(matches!(
            service.verify_access_token(&token),
            Err(AppError::ExpiredToken)
        ));

        let foreign = encode(
            &Header::default(),
            &AccessClaims { exp: Utc::now().timestamp() + 60, ..expired },
            &EncodingKey::from_secret(b"someone-elses-secret"),
        )
        .unwrap();
        assert!(matches!(
            service.verify_access_token(&foreign),
            Err(AppError::InvalidSignature)
        ));
        assert!(matches!(
            service.verify_access_token("garbage"),
            Err(AppError::InvalidSignature)
        ));
    }

    #[actix_web::test]
    async fn test_rotate_invalidates_previous_refresh_token() {
        let (service, store) = service();
        let user = User::new_local("a@x.com".into(), "Ann".into(), "hash".into());
        let original = service.issue_refresh_token(&user).unwrap();
        let mut user = user;
        user.refresh_token = Some(original.clone());
        store.create(user).await.unwrap();

        let pair = service.rotate(&original).await.unwrap();
        assert_ne!(pair.refresh_token, original);

        assert!(matches!(
            service.rotate(&original).await,
            Err(AppError::InvalidRefreshToken)
        ));
        assert!(service.rotate(&pair.refresh_token).await.is_ok());
    }

    #[actix_web::test]
    async fn test_rotate_collapses_every_failure() {
        let (service, store) = service();

        assert!(matches!(
            service.rotate("garbage").await,
            Err(AppError::InvalidRefreshToken)
        ));

        // 저장되지 않은 사용자
        let ghost = User::new_local("g@x.com".into(), "Ghost".into(), "hash".into());
        let ghost_token = service.issue_refresh_token(&ghost).unwrap();
        assert!(matches!(
            service.rotate(&ghost_token).await,
            Err(AppError::InvalidRefreshToken)
        ));

        // 비활성 계정
        let user = stored_user(&store, None).await;
        let token = service.issue_refresh_token(&user).unwrap();
        store
            .update(
                &user.id_string(),
                UserChanges {
                    refresh_token: Some(Some(token.clone())),
                    is_active: Some(false),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            service.rotate(&token).await,
            Err(AppError::InvalidRefreshToken)
        ));
    }

    #[actix_web::test]
    async fn test_api_key_generate_and_revoke() {
        let (service, store) = service();
        let user = stored_user(&store, None).await;
        let id = user.id_string();

        let key = service.generate_api_key(&id).await.unwrap();
        let parts: Vec<&str> = key.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "mk");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 13);

        let stored = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.api_key_hash, Some(hash_api_key(&key)));
        assert_ne!(stored.api_key_hash.as_deref(), Some(key.as_str()));

        let second = service.generate_api_key(&id).await.unwrap();
        assert_ne!(key, second);
        assert!(store.find_by_api_key_hash(&hash_api_key(&key)).await.unwrap().is_none());

        service.revoke_api_key(&id).await.unwrap();
        service.revoke_api_key(&id).await.unwrap();
        let stored = store.find_by_id(&id).await.unwrap().unwrap();
        assert!(stored.api_key_hash.is_none());
    }

    #[actix_web::test]
    async fn test_api_key_for_unknown_user() {
        let (service, _) = service();
        let missing = mongodb::bson::oid::ObjectId::new().to_hex();

        assert!(matches!(
            service.generate_api_key(&missing).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.revoke_api_key(&missing).await.is_ok());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("bearer abc"), None);
    }

    #[test]
    fn test_hash_api_key_is_stable_hex() {
        let digest = hash_api_key("mk_1_abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_api_key("mk_1_abc"));
        assert_ne!(digest, hash_api_key("mk_1_abd"));
    }
}
