// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedIdentity,
    models::principal::Role,
};

/// 1. O Trait que define um conjunto de cargos permitidos.
/// Conjunto vazio = operação irrestrita (qualquer autenticado passa).
pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T: RoleSet>(pub PhantomData<T>);

pub(crate) fn role_permitted(allowed: &[Role], role: Role) -> bool {
    allowed.is_empty() || allowed.contains(&role)
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // O auth_guard já rodou e deixou a identidade nos extensions.
        let identity = parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .ok_or(AppError::TokenInvalid)?;

        // Cargo insuficiente é 403, não 401: a pessoa ESTÁ autenticada.
        if !role_permitted(T::allowed(), identity.role) {
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS CONJUNTOS DE CARGOS
// ---

pub struct AdminOnly;
impl RoleSet for AdminOnly {
    fn allowed() -> &'static [Role] {
        &[Role::Admin]
    }
}

pub struct ManagerOrAdmin;
impl RoleSet for ManagerOrAdmin {
    fn allowed() -> &'static [Role] {
        &[Role::Admin, Role::Manager]
    }
}
