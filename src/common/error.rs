use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // Falha de validação de negócio (campo obrigatório ausente, veto de hook).
    // A mensagem é visível para o usuário.
    #[error("{0}")]
    Validation(String),

    #[error("Erro de validação")]
    PayloadValidation(#[from] validator::ValidationErrors),

    // Corpo JSON que nem chegou a desserializar (sintaxe, tipo errado,
    // content-type ausente). Nunca toca o banco.
    #[error("Payload malformado: {0}")]
    MalformedPayload(String),

    #[error("Cliente não encontrado")]
    CustomerNotFound,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de template")]
    TemplateError(#[from] minijinja::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message),

            // Junta as mensagens do validator em uma única string,
            // mantendo o envelope { success, error } uniforme.
            AppError::PayloadValidation(errors) => {
                let mut messages: Vec<String> = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    for e in field_errors.iter() {
                        if let Some(m) = &e.message {
                            messages.push(format!("{}: {}", field, m));
                        }
                    }
                }
                (StatusCode::BAD_REQUEST, messages.join("; "))
            }

            AppError::MalformedPayload(message) => (StatusCode::BAD_REQUEST, message),

            AppError::CustomerNotFound => {
                (StatusCode::NOT_FOUND, "Cliente não encontrado.".to_string())
            }

            // Todos os outros erros viram 500. O `tracing` loga a mensagem
            // detalhada; o cliente recebe só uma mensagem genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Envelope padrão de falha da API.
        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}
