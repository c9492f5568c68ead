//! # 인증 오케스트레이터
//!
//! 자격 증명 검증, 토큰 서비스, 사용자 저장소를 조합해 가입/로그인/외부 공급자
//! 로그인/토큰 갱신/로그아웃/API 키 흐름을 구현합니다.
//!
//! 각 흐름은 정확히 한 사용자 레코드만 변경하며, 그 변경은 저장소의 원자적
//! 연산 한 번으로 끝납니다. 새 사용자는 첫 리프레시 토큰을 포함한 상태로 한 번에 저장됩니다.
//!
//! ## 외부 공급자 계정 연결 규칙
//!
//! ```text
//! 공급자 ID로 조회 ── 있음 ──► 로그인
//!        │
//!        없음
//!        ▼
//! 이메일로 조회 ── 없음 ──► 새 사용자 생성 (is_new_user = true)
//!        │
//!        있음
//!        ├─ 로컬 계정 ─────────────────────────► 공급자 ID 연결 후 로그인
//!        ├─ 같은 공급자, 공급자 ID 비어 있음 ────► 연결 후 로그인
//!        └─ 다른 공급자 / 다른 공급자 ID ────────► ProviderConflict
//! ```

use std::sync::Arc;

use validator::Validate;

use super::credential_verifier::{hash_password, verify_password, IdTokenVerifier};
use super::token_service::TokenService;
use crate::config::AuthProvider;
use crate::core::{AppError, AppResult};
use crate::domain::dto::users::request::{LoginRequest, RegisterRequest};
use crate::domain::dto::users::response::{AuthResponse, UserResponse};
use crate::domain::entities::users::{User, UserChanges};
use crate::domain::models::oauth::{AppleProfile, GoogleProfile};
use crate::domain::models::token::TokenPair;
use crate::repositories::users::UserStore;
use crate::utils::{normalize_email, validate_required_string};

/// 인증 흐름의 결과
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub tokens: TokenPair,
    pub is_new_user: bool,
}

impl AuthResult {
    /// 외부 공급자 로그인처럼 `isNewUser`를 노출하는 응답으로 변환합니다.
    pub fn into_federated_response(self) -> AuthResponse {
        AuthResponse {
            user: UserResponse::from(&self.user),
            tokens: self.tokens,
            is_new_user: Some(self.is_new_user),
        }
    }
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        AuthResponse {
            user: UserResponse::from(&result.user),
            tokens: result.tokens,
            is_new_user: None,
        }
    }
}

/// 검증된 외부 공급자 신원
struct FederatedIdentity {
    provider: AuthProvider,
    subject: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    email_verified: bool,
}

impl From<GoogleProfile> for FederatedIdentity {
    fn from(profile: GoogleProfile) -> Self {
        let name = profile.display_name();
        Self {
            provider: AuthProvider::Google,
            subject: profile.sub,
            email: Some(profile.email),
            name: Some(name),
            picture: profile.picture,
            email_verified: profile.email_verified,
        }
    }
}

impl From<AppleProfile> for FederatedIdentity {
    fn from(profile: AppleProfile) -> Self {
        Self {
            provider: AuthProvider::Apple,
            subject: profile.sub,
            email: profile.email,
            name: None,
            picture: None,
            email_verified: true,
        }
    }
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: Arc<TokenService>,
    google: Arc<dyn IdTokenVerifier<Profile = GoogleProfile>>,
    apple: Arc<dyn IdTokenVerifier<Profile = AppleProfile>>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: Arc<TokenService>,
        google: Arc<dyn IdTokenVerifier<Profile = GoogleProfile>>,
        apple: Arc<dyn IdTokenVerifier<Profile = AppleProfile>>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            tokens,
            google,
            apple,
            bcrypt_cost,
        }
    }

    /// 이메일/비밀번호 회원가입
    ///
    /// # Arguments
    ///
    /// * `request` - 이메일, 이름(1자 이상), 비밀번호(8자 이상)
    ///
    /// # Returns
    ///
    /// * `Ok(AuthResult)` - 생성된 사용자와 첫 토큰 쌍
    ///
    /// # Errors
    ///
    /// * `AppError::ValidationError` - 입력값 검증 실패
    /// * `AppError::AlreadyExists` - 어떤 공급자로든 이미 가입된 이메일
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = auth_service.register(RegisterRequest {
    ///     email: "a@x.com".into(),
    ///     name: "Ann".into(),
    ///     password: "pw123456".into(),
    /// }).await?;
    /// assert!(result.is_new_user);
    /// ```
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResult> {
        request
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let email = normalize_email(&request.email);
        let name = validate_required_string(&request.name, "이름")?;

        if self.store.find_by_email(&email).await?.is_some() {
            log::info!("가입 거부: 이미 존재하는 이메일");
            return Err(AppError::AlreadyExists);
        }

        let password_hash = hash_password(&request.password, self.bcrypt_cost).await?;

        let mut user = User::new_local(email, name, password_hash);
        let tokens = self.tokens.issue_token_pair(&user)?;
        UserChanges::login(tokens.refresh_token.clone()).apply_to(&mut user);

        let user = self.store.create(user).await?;
        log::info!("새 로컬 사용자 가입 (id={})", user.id_string());

        Ok(AuthResult {
            user,
            tokens,
            is_new_user: true,
        })
    }

    /// 이메일/비밀번호 로그인
    ///
    /// 이메일 없음, 외부 공급자 전용 계정, 비밀번호 불일치는 모두 같은
    /// `InvalidCredentials`로 응답합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ValidationError` - 입력값 검증 실패
    /// * `AppError::InvalidCredentials` - 자격 증명 불일치
    /// * `AppError::AccountDeactivated` - 비활성 계정
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResult> {
        request
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let email = normalize_email(&request.email);

        let Some(user) = self.store.find_by_email(&email).await? else {
            log::info!("로그인 실패: 등록되지 않은 이메일");
            return Err(AppError::InvalidCredentials);
        };

        if !user.can_authenticate_with_password() {
            log::info!(
                "로그인 실패: {} 계정에 비밀번호 로그인 시도 (id={})",
                user.auth_provider.as_str(),
                user.id_string()
            );
            return Err(AppError::InvalidCredentials);
        }

        if !verify_password(&request.password, user.password_hash.as_deref()).await {
            log::info!("로그인 실패: 비밀번호 불일치 (id={})", user.id_string());
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AppError::AccountDeactivated);
        }

        self.start_session(user, UserChanges::default()).await
    }

    /// Google ID 토큰 로그인
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidToken` - ID 토큰 검증 실패
    /// * `AppError::ExternalServiceError` - Google 공개키 조회 실패
    /// * `AppError::ProviderConflict` - 이메일이 다른 공급자 계정에 바인딩됨
    /// * `AppError::AccountDeactivated` - 비활성 계정
    pub async fn google_sign_in(&self, id_token: &str) -> AppResult<AuthResult> {
        let profile = self.google.verify(id_token).await?;
        self.federated_sign_in(profile.into()).await
    }

    /// Apple ID 토큰 로그인
    ///
    /// 이메일이 없는 토큰은 이미 연결된 계정에만 로그인할 수 있습니다.
    ///
    /// # Errors
    ///
    /// `google_sign_in`과 같습니다. 처음 보는 Apple 사용자의 토큰에 이메일이 없으면
    /// `AppError::InvalidToken`입니다.
    pub async fn apple_sign_in(&self, id_token: &str) -> AppResult<AuthResult> {
        let profile = self.apple.verify(id_token).await?;
        self.federated_sign_in(profile.into()).await
    }

    /// 리프레시 토큰으로 새 토큰 쌍을 발급합니다.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> AppResult<TokenPair> {
        self.tokens.rotate(refresh_token).await
    }

    /// 저장된 리프레시 토큰을 지웁니다. 여러 번 호출해도 안전합니다.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let changes = UserChanges {
            refresh_token: Some(None),
            ..UserChanges::default()
        };

        if self.store.update(user_id, changes).await?.is_some() {
            log::info!("로그아웃 (id={})", user_id);
        }
        Ok(())
    }

    pub async fn generate_api_key(&self, user_id: &str) -> AppResult<String> {
        self.tokens.generate_api_key(user_id).await
    }

    pub async fn revoke_api_key(&self, user_id: &str) -> AppResult<()> {
        self.tokens.revoke_api_key(user_id).await
    }

    /// 현재 사용자 정보를 저장소에서 다시 읽어 공개 형태로 반환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::NotFound` - 요청 처리 중 사용자가 사라진 경우
    pub async fn me(&self, user_id: &str) -> AppResult<UserResponse> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))
    }

    /// 이미 신원이 확인된 사용자 ID로 새 세션(토큰 쌍)을 발급하고 저장합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::NotFound` - 사용자 없음
    /// * `AppError::AccountDeactivated` - 비활성 계정
    pub async fn issue_session(&self, user_id: &str) -> AppResult<AuthResult> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))?;

        if !user.is_active {
            return Err(AppError::AccountDeactivated);
        }

        self.start_session(user, UserChanges::default()).await
    }

    async fn federated_sign_in(&self, identity: FederatedIdentity) -> AppResult<AuthResult> {
        let provider = identity.provider;

        if let Some(user) = self
            .store
            .find_by_provider_id(provider, &identity.subject)
            .await?
        {
            if !user.is_active {
                return Err(AppError::AccountDeactivated);
            }
            return self.start_session(user, UserChanges::default()).await;
        }

        let Some(email) = identity.email.clone() else {
            log::info!(
                "{} 로그인 실패: 연결된 계정이 없고 토큰에 이메일이 없습니다",
                provider.as_str()
            );
            return Err(AppError::InvalidToken);
        };

        match self.store.find_by_email(&email).await? {
            Some(existing) => self.link_existing(existing, identity).await,
            None => self.create_federated(email, identity).await,
        }
    }

    /// 이메일이 일치하는 기존 계정에 공급자 ID를 연결합니다.
    async fn link_existing(
        &self,
        existing: User,
        identity: FederatedIdentity,
    ) -> AppResult<AuthResult> {
        let provider = identity.provider;

        // 이미 다른 주체가 연결된 공급자 ID는 덮어쓰지 않음
        let slot_free = existing
            .provider_id(provider)
            .is_none_or(|linked| linked == identity.subject);
        let linkable =
            slot_free && (existing.is_local_auth() || existing.auth_provider == provider);
        if !linkable {
            log::warn!(
                "{} 로그인 거부: 이메일이 {} 계정에 바인딩됨 (id={})",
                provider.as_str(),
                existing.auth_provider.as_str(),
                existing.id_string()
            );
            return Err(AppError::ProviderConflict);
        }

        if !existing.is_active {
            return Err(AppError::AccountDeactivated);
        }

        let mut changes = UserChanges::default().link_provider(provider, identity.subject);
        // 공급자가 검증하지 않은 이메일이면 기존 검증 상태 유지
        if !identity.email_verified {
            changes.email_verified = None;
        }
        if existing.profile_picture.is_none() {
            changes.profile_picture = identity.picture;
        }

        log::info!(
            "{} 계정 연결 (id={})",
            provider.as_str(),
            existing.id_string()
        );
        self.start_session(existing, changes).await
    }

    async fn create_federated(
        &self,
        email: String,
        identity: FederatedIdentity,
    ) -> AppResult<AuthResult> {
        let name = identity.name.unwrap_or_else(|| email.clone());
        let mut user = User::new_federated(
            email,
            name,
            identity.provider,
            identity.subject,
            identity.picture,
        );

        let tokens = self.tokens.issue_token_pair(&user)?;
        UserChanges::login(tokens.refresh_token.clone()).apply_to(&mut user);

        let user = self.store.create(user).await?;
        log::info!(
            "새 {} 사용자 가입 (id={})",
            user.auth_provider.as_str(),
            user.id_string()
        );

        Ok(AuthResult {
            user,
            tokens,
            is_new_user: true,
        })
    }

    /// 기존 사용자에게 토큰 쌍을 발급하고, 추가 변경과 함께 한 번의 갱신으로 저장합니다.
    async fn start_session(&self, user: User, extra: UserChanges) -> AppResult<AuthResult> {
        let tokens = self.tokens.issue_token_pair(&user)?;

        let changes = UserChanges {
            last_login_at: Some(mongodb::bson::DateTime::now()),
            refresh_token: Some(Some(tokens.refresh_token.clone())),
            ..extra
        };

        let user = self
            .store
            .update(&user.id_string(), changes)
            .await?
            .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))?;

        Ok(AuthResult {
            user,
            tokens,
            is_new_user: false,
        })
    }
}
