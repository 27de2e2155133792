use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
//
// Regra de ouro do login: o cliente NUNCA consegue distinguir "negócio não
// existe" de "usuário não existe" de "senha errada" de "conta inativa".
// Internamente as variantes são distintas (para logs e testes), mas todas
// viram o mesmo 401 genérico na resposta.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Conta inativa")]
    InactiveAccount,

    #[error("Token inválido")]
    TokenInvalid,

    #[error("Token expirado")]
    TokenExpired,

    #[error("Sessão não registrada")]
    SessionNotFound,

    #[error("Falha ao gerenciar sessões")]
    SessionManagementError,

    #[error("Refresh token não fornecido")]
    MissingRefreshToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::MissingRefreshToken => {
                (StatusCode::BAD_REQUEST, "Refresh token não fornecido.")
            }

            // A família do login: uma única mensagem para todas.
            AppError::InvalidCredentials | AppError::InactiveAccount => {
                (StatusCode::UNAUTHORIZED, "Credenciais inválidas.")
            }

            // A família do token: idem. A falha de persistência durante o
            // registro de sessão também cai aqui; o detalhe já foi logado.
            AppError::TokenInvalid
            | AppError::TokenExpired
            | AppError::SessionNotFound
            | AppError::SessionManagementError => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou expirado.",
            ),

            AppError::Forbidden => (StatusCode::FORBIDDEN, "Acesso negado. Cargo insuficiente."),

            AppError::UserNotFound => (StatusCode::NOT_FOUND, "Usuário não encontrado."),

            // Todos os outros erros (DatabaseError, JwtError, InternalServerError)
            // viram 500. O `tracing` loga a mensagem detalhada do `thiserror`.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
