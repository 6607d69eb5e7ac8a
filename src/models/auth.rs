// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::tenancy::OrgRole;

// Estrutura de dados ("claims") dentro do JWT emitido pelo serviço de login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub org_id: String,
    pub role: OrgRole,
    pub iat: usize, // Issued At (quando o token foi criado)
    pub exp: usize, // Expiration time (quando o token expira)
}

/// Identidade da requisição: quem é, de qual organização, com qual papel.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub org_id: String,
    pub role: OrgRole,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            org_id: claims.org_id,
            role: claims.role,
        }
    }
}
