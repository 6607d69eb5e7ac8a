use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

// O erro de domínio. Nunca sai cru para o cliente: vira ApiError antes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{entity} não encontrado: {key}")]
    NotFound { entity: &'static str, key: String },

    // Organização pedida não é a do usuário
    #[error("Acesso negado à organização {requested_org}")]
    AccessDenied { requested_org: String },

    #[error("O tenant {tenant_id} não pertence à organização {org_id}")]
    TenantNotInOrg { tenant_id: String, org_id: String },

    #[error("É necessário o papel '{required}' (atual: '{actual}')")]
    InsufficientRole { required: String, actual: String },

    #[error("Template de seção ausente: {section_type}.{variant}")]
    TemplateMissing { section_type: String, variant: String },

    #[error("ID de organização inválido: {0}")]
    InvalidOrgId(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Documento armazenado com formato inválido: {0}")]
    Serialization(#[from] serde_json::Error),

    // `anyhow::Error` carrega o contexto de falhas inesperadas.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Identificador estável do tipo de erro, exposto no corpo da resposta.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::NotFound { .. } => "notFound",
            AppError::AccessDenied { .. } => "accessDenied",
            AppError::TenantNotInOrg { .. } => "tenantNotInOrg",
            AppError::InsufficientRole { .. } => "insufficientRole",
            AppError::TemplateMissing { .. } => "templateMissing",
            AppError::InvalidOrgId(_) => "invalidOrgId",
            AppError::InvalidToken => "invalidToken",
            AppError::DatabaseError(_)
            | AppError::Serialization(_)
            | AppError::InternalServerError(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidOrgId(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AccessDenied { .. }
            | AppError::TenantNotInOrg { .. }
            | AppError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::TemplateMissing { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_)
            | AppError::Serialization(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        let status = self.status();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                (
                    "Um ou mais campos são inválidos.".to_string(),
                    Some(Value::Object(details)),
                )
            }
            // Erros de infraestrutura: o detalhe fica só no log.
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = ?e, "Erro Interno do Servidor: {}", e);
                ("Ocorreu um erro inesperado.".to_string(), None)
            }
            e => (e.to_string(), None),
        };

        ApiError {
            status,
            kind: self.kind().to_string(),
            error,
            details,
        }
    }
}

/// O corpo de erro que os handlers devolvem.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub kind: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "badRequest".to_string(),
            error: message.into(),
            details: None,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        err.to_api_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}
