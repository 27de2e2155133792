// src/db/mock.rs
//
// PrincipalStore em memória para os testes de serviço. O contador de
// chamadas permite afirmar que certos fluxos (refresh expirado) nunca
// tocam o armazenamento.

use std::sync::{
    atomic::{AtomicI64, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PrincipalStore,
    models::principal::{PrincipalRef, Session, Tenant, User},
};

#[derive(Default)]
pub struct MockPrincipalStore {
    tenants: Mutex<Vec<Tenant>>,
    users: Mutex<Vec<User>>,
    sessions: Mutex<Vec<Session>>,
    next_session_id: AtomicI64,
    calls: AtomicUsize,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl MockPrincipalStore {
    pub fn new() -> Self {
        Self {
            next_session_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    pub fn add_tenant(&self, tenant: Tenant) {
        self.tenants.lock().unwrap().push(tenant);
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn sessions_of(&self, principal: PrincipalRef) -> Vec<Session> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.principal_kind == principal.kind && s.principal_id == principal.id)
            .cloned()
            .collect()
    }

    /// Quantas chamadas (de qualquer método) o armazenamento recebeu.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Simula indisponibilidade do banco nas escritas de sessão.
    pub fn fail_session_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PrincipalStore for MockPrincipalStore {
    async fn find_tenant_by_business_name_and_email(
        &self,
        business_name: &str,
        email: &str,
    ) -> Result<Option<Tenant>, AppError> {
        self.tick();
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.business_name == business_name && t.email == email)
            .cloned())
    }

    async fn find_tenant_by_business_name(
        &self,
        business_name: &str,
    ) -> Result<Option<Tenant>, AppError> {
        self.tick();
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.business_name == business_name)
            .cloned())
    }

    async fn find_tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        self.tick();
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn find_user_by_email_and_tenant(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> Result<Option<User>, AppError> {
        self.tick();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email && u.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.tick();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn push_session_bounded(
        &self,
        principal: PrincipalRef,
        token: &str,
        device_info: &str,
        max_sessions: i32,
    ) -> Result<(), AppError> {
        self.tick();
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("banco indisponível (simulado)").into());
        }

        let mut sessions = self.sessions.lock().unwrap();
        let cap = max_sessions.max(1) as usize;
        loop {
            let mine: Vec<i64> = sessions
                .iter()
                .filter(|s| s.principal_kind == principal.kind && s.principal_id == principal.id)
                .map(|s| s.id)
                .collect();
            if mine.len() < cap {
                break;
            }
            // FIFO: o menor id é o mais antigo.
            let oldest = *mine.iter().min().unwrap();
            sessions.retain(|s| s.id != oldest);
        }

        let now = Utc::now();
        sessions.push(Session {
            id: self.next_session_id.fetch_add(1, Ordering::SeqCst),
            principal_kind: principal.kind,
            principal_id: principal.id,
            token: token.to_owned(),
            created_at: now,
            last_used: now,
            device_info: device_info.to_owned(),
        });
        Ok(())
    }

    async fn find_session(
        &self,
        principal: PrincipalRef,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        self.tick();
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| {
                s.principal_kind == principal.kind
                    && s.principal_id == principal.id
                    && s.token == token
            })
            .cloned())
    }

    async fn rotate_session(
        &self,
        principal: PrincipalRef,
        old_token: &str,
        new_token: &str,
    ) -> Result<bool, AppError> {
        self.tick();
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("banco indisponível (simulado)").into());
        }
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.iter_mut().find(|s| {
            s.principal_kind == principal.kind
                && s.principal_id == principal.id
                && s.token == old_token
        }) {
            Some(session) => {
                session.token = new_token.to_owned();
                session.last_used = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_session(
        &self,
        principal: PrincipalRef,
        token: &str,
    ) -> Result<bool, AppError> {
        self.tick();
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| {
            !(s.principal_kind == principal.kind
                && s.principal_id == principal.id
                && s.token == token)
        });
        Ok(sessions.len() < before)
    }

    async fn clear_sessions(&self, principal: PrincipalRef) -> Result<u64, AppError> {
        self.tick();
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| !(s.principal_kind == principal.kind && s.principal_id == principal.id));
        Ok((before - sessions.len()) as u64)
    }
}
