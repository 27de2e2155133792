// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    db::PrincipalStore,
    models::{
        auth::AccessClaims,
        principal::{PrincipalKind, PrincipalRef, Role},
    },
};

// A identidade resolvida e RE-VALIDADA de quem assina a requisição.
// É o que os módulos a jusante (produtos, vendas, turnos...) enxergam.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    pub principal_id: Uuid,
    pub kind: PrincipalKind,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
}

impl AuthenticatedIdentity {
    pub fn principal_ref(&self) -> PrincipalRef {
        PrincipalRef {
            kind: self.kind,
            id: self.principal_id,
        }
    }
}

// O middleware em si: token não é autossuficiente. Além da assinatura,
// o principal é rebuscado no armazenamento A CADA requisição — desativar
// uma conta derruba o acesso dela dentro de uma requisição, não quando o
// token expirar.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok());

    if let Some(auth_header) = auth_header {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            let claims = app_state.token_codec.verify_access(token)?;
            let identity =
                resolve_identity(app_state.principal_store.as_ref(), claims).await?;

            // Insere a identidade nos "extensions" da requisição
            request.extensions_mut().insert(identity);
            return Ok(next.run(request).await);
        }
    }

    Err(AppError::TokenInvalid)
}

// O access token não carrega `sub`, então a resolução repete a precedência
// do login: se o e-mail da claim é o do próprio Tenant, o principal é o
// Tenant; senão é um User daquele tenant.
async fn resolve_identity(
    store: &dyn PrincipalStore,
    claims: AccessClaims,
) -> Result<AuthenticatedIdentity, AppError> {
    if let Some(tenant) = store.find_tenant_by_id(claims.tenant_id).await? {
        if tenant.email == claims.email {
            if !tenant.is_active {
                return Err(AppError::InactiveAccount);
            }
            return Ok(AuthenticatedIdentity {
                principal_id: tenant.id,
                kind: PrincipalKind::Tenant,
                tenant_id: tenant.id,
                email: tenant.email,
                role: Role::Admin,
                name: tenant.business_name,
            });
        }
    }

    let user = store
        .find_user_by_email_and_tenant(&claims.email, claims.tenant_id)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    if !user.is_active {
        return Err(AppError::InactiveAccount);
    }

    Ok(AuthenticatedIdentity {
        principal_id: user.id,
        kind: PrincipalKind::User,
        tenant_id: user.tenant_id,
        email: user.email,
        role: user.role,
        name: user.name,
    })
}

// Extrator para obter a identidade autenticada diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .ok_or(AppError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockPrincipalStore;
    use crate::models::principal::{Tenant, User};
    use chrono::Utc;
    use uuid::Uuid;

    fn tenant() -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            business_name: "Tech Corp".into(),
            email: "admin@techcorp.com".into(),
            password_hash: "x".into(),
            is_active: true,
            max_sessions: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn claims_for(tenant_id: Uuid, email: &str, role: Role) -> AccessClaims {
        let now = Utc::now().timestamp() as usize;
        AccessClaims {
            tenant_id,
            email: email.into(),
            role,
            business_name: None,
            username: None,
            iat: now,
            exp: now + 900,
        }
    }

    // O e-mail da claim é o do próprio Tenant: resolve como Tenant/ADMIN.
    #[tokio::test]
    async fn tenant_email_resolves_the_tenant_itself() {
        let store = MockPrincipalStore::new();
        let t = tenant();
        let tenant_id = t.id;
        store.add_tenant(t);

        let identity = resolve_identity(
            &store,
            claims_for(tenant_id, "admin@techcorp.com", Role::Admin),
        )
        .await
        .unwrap();

        assert_eq!(identity.kind, PrincipalKind::Tenant);
        assert_eq!(identity.principal_id, tenant_id);
        assert_eq!(identity.role, Role::Admin);
    }

    // Outro e-mail dentro do mesmo tenant: resolve o User, com o cargo DELE.
    #[tokio::test]
    async fn user_email_resolves_the_user_with_its_own_role() {
        let store = MockPrincipalStore::new();
        let t = tenant();
        let tenant_id = t.id;
        store.add_tenant(t);
        let user = User {
            id: Uuid::new_v4(),
            tenant_id,
            name: "Caixa 1".into(),
            email: "caixa@techcorp.com".into(),
            password_hash: "x".into(),
            is_active: true,
            role: Role::Cashier,
            max_sessions: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user_id = user.id;
        store.add_user(user);

        let identity = resolve_identity(
            &store,
            claims_for(tenant_id, "caixa@techcorp.com", Role::Cashier),
        )
        .await
        .unwrap();

        assert_eq!(identity.kind, PrincipalKind::User);
        assert_eq!(identity.principal_id, user_id);
        assert_eq!(identity.tenant_id, tenant_id);
        assert_eq!(identity.role, Role::Cashier);
    }

    // Token assinado ontem, conta desativada hoje: cai AGORA, não no expiry.
    #[tokio::test]
    async fn deactivation_is_observed_within_one_request() {
        let store = MockPrincipalStore::new();
        let mut t = tenant();
        t.is_active = false;
        let tenant_id = t.id;
        store.add_tenant(t);

        let err = resolve_identity(
            &store,
            claims_for(tenant_id, "admin@techcorp.com", Role::Admin),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InactiveAccount));
    }

    // Claims válidas apontando para ninguém (principal apagado).
    #[tokio::test]
    async fn vanished_principal_is_token_invalid() {
        let store = MockPrincipalStore::new();
        let err = resolve_identity(
            &store,
            claims_for(Uuid::new_v4(), "alguem@algum.com", Role::Admin),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid));
    }
}
