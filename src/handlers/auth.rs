// src/handlers/auth.rs

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::{headers::UserAgent, TypedHeader};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedIdentity,
        rbac::{AdminOnly, RequireRole},
    },
    models::auth::{
        LoginPayload, LoginResponse, LogoutPayload, MessageResponse, RefreshPayload,
        RefreshResponse, RevokeResponse,
    },
};

// Handler de login: um único endpoint para Tenants e Users.
pub async fn login(
    State(app_state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // O User-Agent vira o deviceInfo da sessão registrada.
    let device_info = user_agent
        .as_ref()
        .map(|ua| ua.as_str())
        .unwrap_or("desconhecido");

    let response = app_state
        .auth_service
        .login(
            &payload.business_name,
            &payload.email,
            &payload.password,
            device_info,
        )
        .await?;

    Ok(Json(response))
}

// Handler de refresh: troca o refresh token registrado por um novo par.
pub async fn refresh(
    State(app_state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<RefreshResponse>, AppError> {
    // Campo ausente é 400; token inválido/expirado é 401.
    let refresh_token = payload
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingRefreshToken)?;

    let response = app_state.auth_service.refresh(&refresh_token).await?;
    Ok(Json(response))
}

// Logout por dispositivo: encerra só a sessão do refresh token enviado.
pub async fn logout(
    State(app_state): State<AppState>,
    identity: AuthenticatedIdentity,
    Json(payload): Json<LogoutPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    let refresh_token = payload
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or(AppError::MissingRefreshToken)?;

    app_state
        .auth_service
        .logout_session(identity.principal_ref(), &refresh_token)
        .await?;

    Ok(Json(MessageResponse {
        message: "Sessão encerrada com sucesso.".into(),
    }))
}

// Logout em todo lugar: derruba todas as sessões do principal.
pub async fn logout_all(
    State(app_state): State<AppState>,
    identity: AuthenticatedIdentity,
) -> Result<Json<MessageResponse>, AppError> {
    app_state
        .auth_service
        .logout_all(identity.principal_ref())
        .await?;

    Ok(Json(MessageResponse {
        message: "Todas as sessões foram encerradas.".into(),
    }))
}

// Handler da rota protegida /me: ecoa a identidade já re-validada.
pub async fn me(identity: AuthenticatedIdentity) -> Json<AuthenticatedIdentity> {
    Json(identity)
}

// Um ADMIN derruba todas as sessões de um usuário do seu tenant.
pub async fn revoke_user_sessions(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminOnly>,
    identity: AuthenticatedIdentity,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RevokeResponse>, AppError> {
    let revoked = app_state
        .auth_service
        .revoke_user_sessions(identity.tenant_id, user_id)
        .await?;

    Ok(Json(RevokeResponse {
        message: "Sessões do usuário revogadas.".into(),
        revoked,
    }))
}
