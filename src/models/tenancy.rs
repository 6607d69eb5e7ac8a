// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ---
// 1. Organization (A "Empresa")
// ---
// Dona de vários tenants. O ID tem 8 caracteres (alfabeto nanoid).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[schema(example = "Ab3_x-9Z")]
    pub id: String,
    pub name: String,
    pub default_tenant: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Tenant (O "Espaço de trabalho")
// ---
// Pertence a exatamente uma organização durante toda a vida.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[schema(example = "acme")]
    pub id: String,
    pub name: String,
    pub org_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. OrgRole (nível de autoridade na organização)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Member,
    Admin,
    Owner,
}

impl OrgRole {
    /// owner(3) > admin(2) > member(1)
    pub fn level(self) -> u8 {
        match self {
            OrgRole::Member => 1,
            OrgRole::Admin => 2,
            OrgRole::Owner => 3,
        }
    }

    pub fn satisfies(self, required: OrgRole) -> bool {
        self.level() >= required.level()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrgRole::Member => "member",
            OrgRole::Admin => "admin",
            OrgRole::Owner => "owner",
        }
    }
}

// ---
// 4. Resposta de GET /api/tenants
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationTenants {
    pub organization: Organization,
    pub tenants: Vec<Tenant>,
}
