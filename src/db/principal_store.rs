// src/db/principal_store.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PrincipalStore,
    models::principal::{PrincipalRef, Session, Tenant, User},
};

// O repositório de principals, responsável por todas as interações com as
// tabelas 'tenants', 'users' e 'sessions'.
#[derive(Clone)]
pub struct PgPrincipalStore {
    pool: PgPool,
}

impl PgPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn find_tenant_by_business_name_and_email(
        &self,
        business_name: &str,
        email: &str,
    ) -> Result<Option<Tenant>, AppError> {
        let maybe_tenant = sqlx::query_as::<_, Tenant>(
            "SELECT * FROM tenants WHERE business_name = $1 AND email = $2",
        )
        .bind(business_name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_tenant)
    }

    async fn find_tenant_by_business_name(
        &self,
        business_name: &str,
    ) -> Result<Option<Tenant>, AppError> {
        let maybe_tenant =
            sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE business_name = $1")
                .bind(business_name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(maybe_tenant)
    }

    async fn find_tenant_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let maybe_tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_tenant)
    }

    async fn find_user_by_email_and_tenant(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let maybe_user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND tenant_id = $2")
                .bind(email)
                .bind(tenant_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(maybe_user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Evicção + inserção dentro de UMA transação. O `FOR UPDATE` serializa
    // logins concorrentes do mesmo principal: o segundo espera o primeiro
    // commitar e enxerga a lista já atualizada, então o invariante
    // `len(sessions) <= max_sessions` se mantém sem corrida.
    async fn push_session_bounded(
        &self,
        principal: PrincipalRef,
        token: &str,
        device_info: &str,
        max_sessions: i32,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let existing: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM sessions
            WHERE principal_kind = $1 AND principal_id = $2
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(principal.kind)
        .bind(principal.id)
        .fetch_all(&mut *tx)
        .await?;

        let cap = max_sessions.max(1) as usize;
        if existing.len() >= cap {
            // FIFO: caem as mais antigas pela ordem de inserção, não de uso.
            let excess = existing.len() - cap + 1;
            let evict: Vec<i64> = existing.iter().take(excess).map(|row| row.0).collect();
            sqlx::query("DELETE FROM sessions WHERE id = ANY($1)")
                .bind(&evict)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(
                principal_id = %principal.id,
                evicted = evict.len(),
                "sessões mais antigas evictadas para respeitar max_sessions"
            );
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO sessions (principal_kind, principal_id, token, created_at, last_used, device_info)
            VALUES ($1, $2, $3, $4, $4, $5)
            "#,
        )
        .bind(principal.kind)
        .bind(principal.id)
        .bind(token)
        .bind(now)
        .bind(device_info)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_session(
        &self,
        principal: PrincipalRef,
        token: &str,
    ) -> Result<Option<Session>, AppError> {
        let maybe_session = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE principal_kind = $1 AND principal_id = $2 AND token = $3",
        )
        .bind(principal.kind)
        .bind(principal.id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_session)
    }

    // Um único UPDATE: a troca do token e a checagem "a sessão ainda
    // existe?" são a mesma operação, então duas rotações concorrentes do
    // mesmo token nunca têm sucesso as duas.
    async fn rotate_session(
        &self,
        principal: PrincipalRef,
        old_token: &str,
        new_token: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET token = $4, last_used = $5
            WHERE principal_kind = $1 AND principal_id = $2 AND token = $3
            "#,
        )
        .bind(principal.kind)
        .bind(principal.id)
        .bind(old_token)
        .bind(new_token)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_session(
        &self,
        principal: PrincipalRef,
        token: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE principal_kind = $1 AND principal_id = $2 AND token = $3",
        )
        .bind(principal.kind)
        .bind(principal.id)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn clear_sessions(&self, principal: PrincipalRef) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE principal_kind = $1 AND principal_id = $2")
                .bind(principal.kind)
                .bind(principal.id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
