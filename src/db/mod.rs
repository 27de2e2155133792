// src/db/mod.rs

pub mod principal_store;

#[cfg(test)]
pub mod mock;

pub use principal_store::PgPrincipalStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::principal::{PrincipalRef, Session, Tenant, User},
};

/// A fronteira com o armazenamento de principals e sessões.
///
/// As mutações de sessão são primitivas ATÔMICAS no armazenamento — nunca
/// um ler-modificar-gravar do array inteiro. Dois logins concorrentes para
/// o mesmo principal serializam no banco e o limite `max_sessions` nunca é
/// ultrapassado.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_tenant_by_business_name_and_email(
        &self,
        business_name: &str,
        email: &str,
    ) -> Result<Option<Tenant>, AppError>;

    async fn find_tenant_by_business_name(
        &self,
        business_name: &str,
    ) -> Result<Option<Tenant>, AppError>;

    async fn find_tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError>;

    async fn find_user_by_email_and_tenant(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Insere uma sessão, evictando antes as mais antigas (ordem de
    /// inserção, FIFO) que excederiam `max_sessions`. Tudo em uma unidade
    /// atômica.
    async fn push_session_bounded(
        &self,
        principal: PrincipalRef,
        token: &str,
        device_info: &str,
        max_sessions: i32,
    ) -> Result<(), AppError>;

    async fn find_session(
        &self,
        principal: PrincipalRef,
        token: &str,
    ) -> Result<Option<Session>, AppError>;

    /// Troca o token da sessão que casa com `old_token`, preservando
    /// `created_at` e atualizando `last_used`. Retorna `false` se nenhuma
    /// sessão casou (token já rotacionado ou nunca registrado).
    async fn rotate_session(
        &self,
        principal: PrincipalRef,
        old_token: &str,
        new_token: &str,
    ) -> Result<bool, AppError>;

    /// Remove a sessão que casa com `token`. Retorna `false` se não havia.
    async fn remove_session(
        &self,
        principal: PrincipalRef,
        token: &str,
    ) -> Result<bool, AppError>;

    /// Esvazia a lista de sessões do principal. Retorna quantas caíram.
    async fn clear_sessions(&self, principal: PrincipalRef) -> Result<u64, AppError>;
}
