// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::principal::{PrincipalKind, Role};

// Dados para login: o trio (negócio, e-mail, senha).
// O mesmo endpoint resolve Tenants e Users.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "O nome do negócio é obrigatório."))]
    pub business_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Corpo de /auth/refresh. O campo é opcional para podermos responder 400
// (e não um erro de desserialização) quando ele falta.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPayload {
    pub refresh_token: Option<String>,
}

// Corpo de /auth/logout (logout por dispositivo: qual sessão encerrar).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutPayload {
    pub refresh_token: Option<String>,
}

// Resposta de login. `businessName` aparece para Tenants, `username` para
// Users — nunca os dois.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
    #[serde(rename = "businessName", skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub message: String,
    pub revoked: u64,
}

// ---
// Claims
// ---

// Claims do access token (efêmero, 15 minutos, nunca persistido).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub tenant_id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

// Claims do refresh token (7 dias, registrado como Session).
// O `jti` torna cada token único mesmo dentro do mesmo segundo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub tenant_id: Uuid,
    #[serde(rename = "type")]
    pub kind: PrincipalKind,
    pub jti: Uuid,
    pub iat: usize,
    pub exp: usize,
}
