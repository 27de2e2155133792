// src/services/auth.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{crypto, error::AppError},
    db::PrincipalStore,
    models::{
        auth::{LoginResponse, RefreshResponse},
        principal::{Principal, PrincipalKind, PrincipalRef},
    },
    services::{sessions::SessionRegistry, token::TokenCodec},
};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn PrincipalStore>,
    sessions: SessionRegistry,
    codec: TokenCodec,
}

impl AuthService {
    pub fn new(store: Arc<dyn PrincipalStore>, sessions: SessionRegistry, codec: TokenCodec) -> Self {
        Self {
            store,
            sessions,
            codec,
        }
    }

    /// Resolve o login ambíguo entre Tenant e User.
    ///
    /// Passo 1: (businessName, email) casa um Tenant? O Tenant tem
    /// precedência. Passo 2: senão, o businessName resolve o Tenant pai e o
    /// e-mail procura o User dentro dele. Qualquer falha de resolução vira
    /// `InvalidCredentials` — o chamador nunca descobre QUAL parte errou.
    pub async fn login(
        &self,
        business_name: &str,
        email: &str,
        password: &str,
        device_info: &str,
    ) -> Result<LoginResponse, AppError> {
        // Passo 1: procurar na coleção de tenants
        if let Some(tenant) = self
            .store
            .find_tenant_by_business_name_and_email(business_name, email)
            .await?
        {
            if !tenant.is_active {
                return Err(AppError::InactiveAccount);
            }
            Self::check_password(password, &tenant.password_hash).await?;
            return self
                .issue_session(Principal::Tenant(tenant), device_info)
                .await;
        }

        // Passo 2: resolver o tenant pai pelo businessName sozinho
        let tenant = self
            .store
            .find_tenant_by_business_name(business_name)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Passo 3: procurar o usuário dentro do tenant
        let user = self
            .store
            .find_user_by_email_and_tenant(email, tenant.id)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::InactiveAccount);
        }
        Self::check_password(password, &user.password_hash).await?;

        // Passo 4: emitir tokens escopados ao tenant PAI
        self.issue_session(Principal::User(user), device_info).await
    }

    /// Troca um refresh token registrado por um novo par de tokens.
    ///
    /// Contrato de rotação: o token antigo morre na hora — a sessão guarda
    /// o novo token no lugar, preservando `created_at`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AppError> {
        // Assinatura/expiração primeiro: token expirado falha ANTES de
        // qualquer consulta ao banco.
        let claims = self.codec.verify_refresh(refresh_token)?;

        let principal = match claims.kind {
            PrincipalKind::Tenant => self
                .store
                .find_tenant_by_id(claims.sub)
                .await?
                .map(Principal::Tenant),
            PrincipalKind::User => self
                .store
                .find_user_by_id(claims.sub)
                .await?
                .map(Principal::User),
        };

        // Sumiu ou foi desativado: o refresh morre junto.
        let principal = principal.ok_or(AppError::InactiveAccount)?;
        if !principal.is_active() {
            return Err(AppError::InactiveAccount);
        }

        // A rotação também é a checagem de registro: o UPDATE só casa se a
        // sessão ainda existir, então duas trocas concorrentes do mesmo
        // token nunca têm sucesso as duas.
        let new_refresh = self.codec.issue_refresh(&principal)?;
        let rotated = self
            .sessions
            .rotate(principal.to_ref(), refresh_token, &new_refresh)
            .await?;
        if !rotated {
            return Err(AppError::SessionNotFound);
        }

        let access_token = self.codec.issue_access(&principal)?;
        Ok(RefreshResponse {
            access_token,
            refresh_token: new_refresh,
        })
    }

    /// Logout por dispositivo: encerra exatamente a sessão do token dado.
    pub async fn logout_session(
        &self,
        principal: PrincipalRef,
        refresh_token: &str,
    ) -> Result<(), AppError> {
        if !self.sessions.remove(principal, refresh_token).await? {
            return Err(AppError::SessionNotFound);
        }
        Ok(())
    }

    /// Logout em todo lugar: esvazia a lista de sessões do principal.
    pub async fn logout_all(&self, principal: PrincipalRef) -> Result<u64, AppError> {
        self.sessions.clear(principal).await
    }

    /// Um ADMIN derruba todas as sessões de um usuário do SEU tenant
    /// (ex.: funcionário desligado, aparelho perdido).
    pub async fn revoke_user_sessions(
        &self,
        admin_tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, AppError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.tenant_id != admin_tenant_id {
            return Err(AppError::Forbidden);
        }

        let revoked = self
            .sessions
            .clear(PrincipalRef {
                kind: PrincipalKind::User,
                id: user.id,
            })
            .await?;
        tracing::info!(user_id = %user.id, revoked, "sessões do usuário revogadas por um ADMIN");
        Ok(revoked)
    }

    // Emite o par de tokens, registra o refresh como sessão e monta a
    // resposta de login.
    async fn issue_session(
        &self,
        principal: Principal,
        device_info: &str,
    ) -> Result<LoginResponse, AppError> {
        let access_token = self.codec.issue_access(&principal)?;
        let refresh_token = self.codec.issue_refresh(&principal)?;

        self.sessions
            .register(&principal, &refresh_token, device_info)
            .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            role: principal.role(),
            business_name: match &principal {
                Principal::Tenant(t) => Some(t.business_name.clone()),
                Principal::User(_) => None,
            },
            username: match &principal {
                Principal::Tenant(_) => None,
                Principal::User(u) => Some(u.name.clone()),
            },
            email: principal.email().to_owned(),
        })
    }

    // A verificação PBKDF2 é pesada de propósito; roda fora do executor.
    async fn check_password(password: &str, stored_hash: &str) -> Result<(), AppError> {
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();

        let is_valid = tokio::task::spawn_blocking(move || {
            crypto::verify_password(&password, &stored_hash)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }
        Ok(())
    }
}
