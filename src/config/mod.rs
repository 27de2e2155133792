// src/config/mod.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{PgPrincipalStore, PrincipalStore},
    services::{auth::AuthService, sessions::SessionRegistry, token::TokenCodec},
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub bind_addr: String,
    pub principal_store: Arc<dyn PrincipalStore>,
    pub token_codec: TokenCodec,
    pub auth_service: AuthService,
}

impl AppState {
    // Carrega as configurações e monta o gráfico de dependências.
    // A ordem de inicialização é explícita: store -> codec -> registry ->
    // service — nada de módulos se referenciando em círculo.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let principal_store: Arc<dyn PrincipalStore> =
            Arc::new(PgPrincipalStore::new(db_pool.clone()));
        let token_codec = TokenCodec::new(jwt_secret);
        let session_registry = SessionRegistry::new(principal_store.clone());
        let auth_service = AuthService::new(
            principal_store.clone(),
            session_registry,
            token_codec.clone(),
        );

        Ok(Self {
            db_pool,
            bind_addr,
            principal_store,
            token_codec,
            auth_service,
        })
    }
}
