// src/services/sessions.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::PrincipalStore,
    models::principal::{Principal, PrincipalRef, Session},
};

// A lista limitada e ordenada de sessões ativas por principal.
//
// Toda mutação delega para uma primitiva atômica do PrincipalStore; o
// registro nunca lê-modifica-grava o array de sessões por conta própria.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn PrincipalStore>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn PrincipalStore>) -> Self {
        Self { store }
    }

    /// Registra uma nova sessão, evictando a mais antiga (FIFO) se o
    /// principal já estiver no limite. Falha de persistência aqui vira
    /// `SessionManagementError`: logada com detalhe, genérica no fio.
    pub async fn register(
        &self,
        principal: &Principal,
        token: &str,
        device_info: &str,
    ) -> Result<(), AppError> {
        self.store
            .push_session_bounded(
                principal.to_ref(),
                token,
                device_info,
                principal.max_sessions(),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    principal_id = %principal.id(),
                    "falha ao registrar sessão: {e}"
                );
                AppError::SessionManagementError
            })
    }

    pub async fn find(
        &self,
        principal: PrincipalRef,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        self.store.find_session(principal, token).await
    }

    /// Troca o token da sessão em vigor (rotação do refresh), preservando
    /// `created_at` e tocando `last_used`.
    pub async fn rotate(
        &self,
        principal: PrincipalRef,
        old_token: &str,
        new_token: &str,
    ) -> Result<bool, AppError> {
        self.store
            .rotate_session(principal, old_token, new_token)
            .await
    }

    /// Logout por dispositivo: remove exatamente a sessão que casa.
    pub async fn remove(&self, principal: PrincipalRef, token: &str) -> Result<bool, AppError> {
        self.store.remove_session(principal, token).await
    }

    /// Logout em todo lugar: esvazia a lista.
    pub async fn clear(&self, principal: PrincipalRef) -> Result<u64, AppError> {
        self.store.clear_sessions(principal).await
    }
}
