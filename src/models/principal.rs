// src/models/principal.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---
// 1. Role (O "Cargo")
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "principal_role", rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Cashier => "CASHIER",
        }
    }
}

// ---
// 2. PrincipalKind (O discriminante tenant/user)
// ---
// Aparece na claim `type` do refresh token e na tabela de sessões.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "principal_kind", rename_all = "lowercase")]
pub enum PrincipalKind {
    Tenant,
    User,
}

// ---
// 3. Tenant (O "Negócio")
// ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub business_name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub is_active: bool,
    pub max_sessions: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 4. User (O "Funcionário", sempre escopado a um Tenant)
// ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub is_active: bool,
    pub role: Role,
    pub max_sessions: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 5. Principal (A união etiquetada)
// ---
// Tenant e User compartilham o namespace de tokens; o enum carrega o
// discriminante explícito e o `match` exaustivo substitui qualquer
// sondagem estrutural ("tem campo businessName?").
#[derive(Debug, Clone)]
pub enum Principal {
    Tenant(Tenant),
    User(User),
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Tenant(_) => PrincipalKind::Tenant,
            Principal::User(_) => PrincipalKind::User,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Principal::Tenant(t) => t.id,
            Principal::User(u) => u.id,
        }
    }

    /// O escopo de tenant para fins de token: um Tenant é o seu próprio
    /// escopo; um User herda o do Tenant pai.
    pub fn tenant_id(&self) -> Uuid {
        match self {
            Principal::Tenant(t) => t.id,
            Principal::User(u) => u.tenant_id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::Tenant(t) => &t.email,
            Principal::User(u) => &u.email,
        }
    }

    /// Tenants são sempre ADMIN do próprio negócio.
    pub fn role(&self) -> Role {
        match self {
            Principal::Tenant(_) => Role::Admin,
            Principal::User(u) => u.role,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Principal::Tenant(t) => &t.business_name,
            Principal::User(u) => &u.name,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Principal::Tenant(t) => t.is_active,
            Principal::User(u) => u.is_active,
        }
    }

    pub fn max_sessions(&self) -> i32 {
        match self {
            Principal::Tenant(t) => t.max_sessions,
            Principal::User(u) => u.max_sessions,
        }
    }

    pub fn to_ref(&self) -> PrincipalRef {
        PrincipalRef {
            kind: self.kind(),
            id: self.id(),
        }
    }
}

// ---
// 6. PrincipalRef (A "chave" leve de um principal)
// ---
// Tudo que a camada de sessões precisa para endereçar o dono.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub id: Uuid,
}

// ---
// 7. Session (Um refresh token registrado + metadados)
// ---
// O `id` (BIGSERIAL) dá a ordem de inserção usada pela evicção FIFO.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub principal_kind: PrincipalKind,
    pub principal_id: Uuid,

    #[serde(skip_serializing)]
    pub token: String,

    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub device_info: String,
}
