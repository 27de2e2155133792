// src/services/token.rs

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{AccessClaims, RefreshClaims},
        principal::Principal,
    },
};

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

// Assina e verifica os dois tipos de token. Sem estado além do segredo:
// falha é sempre reportada, nunca retentada.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
}

impl TokenCodec {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn issue_access(&self, principal: &Principal) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::minutes(ACCESS_TOKEN_TTL_MINUTES);

        let claims = AccessClaims {
            tenant_id: principal.tenant_id(),
            email: principal.email().to_owned(),
            role: principal.role(),
            business_name: match principal {
                Principal::Tenant(t) => Some(t.business_name.clone()),
                Principal::User(_) => None,
            },
            username: match principal {
                Principal::Tenant(_) => None,
                Principal::User(u) => Some(u.name.clone()),
            },
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn issue_refresh(&self, principal: &Principal) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(REFRESH_TOKEN_TTL_DAYS);

        let claims = RefreshClaims {
            sub: principal.id(),
            tenant_id: principal.tenant_id(),
            kind: principal.kind(),
            jti: Uuid::new_v4(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        let token_data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(map_jwt_error)?;
        Ok(token_data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        let token_data = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(map_jwt_error)?;
        Ok(token_data.claims)
    }
}

// Expirado e inválido são variantes distintas: o refresh expirado tem de
// falhar antes de qualquer consulta ao banco.
fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AppError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::TokenInvalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::principal::{PrincipalKind, Role, Tenant, User};
    use chrono::Utc;

    fn codec() -> TokenCodec {
        TokenCodec::new("segredo-de-teste".into())
    }

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

    fn user(tenant_id: Uuid) -> User {
        User {
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
        }
    }

    #[test]
    fn access_token_roundtrip_for_tenant() {
        let codec = codec();
        let tenant = tenant();
        let principal = Principal::Tenant(tenant.clone());

        let token = codec.issue_access(&principal).unwrap();
        let claims = codec.verify_access(&token).unwrap();

        assert_eq!(claims.tenant_id, tenant.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.business_name.as_deref(), Some("Tech Corp"));
        assert_eq!(claims.username, None);
    }

    #[test]
    fn access_token_roundtrip_for_user() {
        let codec = codec();
        let tenant = tenant();
        let user = user(tenant.id);
        let principal = Principal::User(user.clone());

        let token = codec.issue_access(&principal).unwrap();
        let claims = codec.verify_access(&token).unwrap();

        // O escopo é o tenant pai, nunca o id do próprio usuário.
        assert_eq!(claims.tenant_id, tenant.id);
        assert_eq!(claims.role, Role::Cashier);
        assert_eq!(claims.username.as_deref(), Some("Caixa 1"));
        assert_eq!(claims.business_name, None);
    }

    #[test]
    fn refresh_token_carries_kind_and_sub() {
        let codec = codec();
        let tenant = tenant();
        let user = user(tenant.id);

        let token = codec.issue_refresh(&Principal::User(user.clone())).unwrap();
        let claims = codec.verify_refresh(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.tenant_id, tenant.id);
        assert_eq!(claims.kind, PrincipalKind::User);
    }

    #[test]
    fn refresh_tokens_are_unique_even_in_the_same_second() {
        let codec = codec();
        let principal = Principal::Tenant(tenant());
        let a = codec.issue_refresh(&principal).unwrap();
        let b = codec.issue_refresh(&principal).unwrap();
        assert_ne!(a, b); // jti
    }

    #[test]
    fn expired_token_is_token_expired() {
        let codec = codec();
        let tenant = tenant();
        let now = Utc::now().timestamp() as usize;
        let claims = RefreshClaims {
            sub: tenant.id,
            tenant_id: tenant.id,
            kind: PrincipalKind::Tenant,
            jti: Uuid::new_v4(),
            iat: now - 7200,
            exp: now - 3600, // além da folga padrão de 60s
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("segredo-de-teste".as_ref()),
        )
        .unwrap();

        assert!(matches!(
            codec.verify_refresh(&token),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn wrong_secret_is_token_invalid() {
        let token = codec()
            .issue_access(&Principal::Tenant(tenant()))
            .unwrap();
        let other = TokenCodec::new("outro-segredo".into());
        assert!(matches!(
            other.verify_access(&token),
            Err(AppError::TokenInvalid)
        ));
    }

    #[test]
    fn garbage_is_token_invalid() {
        assert!(matches!(
            codec().verify_access("isto.não.é-um-jwt"),
            Err(AppError::TokenInvalid)
        ));
    }
}
