// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{request::Parts, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::tenancy::Tenant,
};

// Os nomes dos nossos cabeçalhos HTTP customizados
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const ORG_ID_HEADER: &str = "x-org-id";

#[derive(Debug, Default, Deserialize)]
struct ScopeQuery {
    tenant: Option<String>,
    org_id: Option<String>,
}

/// Organização e tenant que a requisição pede (ainda não autorizados).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedScope {
    pub org_id: Option<String>,
    pub tenant_id: Option<String>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Cabeçalho primeiro, depois query string (`?tenant=` / `?org_id=`).
pub fn requested_scope(headers: &HeaderMap, uri: &Uri) -> RequestedScope {
    let query = Query::<ScopeQuery>::try_from_uri(uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    RequestedScope {
        org_id: header_value(headers, ORG_ID_HEADER).or(query.org_id.filter(|v| !v.is_empty())),
        tenant_id: header_value(headers, TENANT_ID_HEADER).or(query.tenant.filter(|v| !v.is_empty())),
    }
}

/// Escopo já autorizado pelo Access Gate.
#[derive(Debug, Clone)]
pub struct OrgContext {
    pub org_id: String,
    pub tenant: Option<Tenant>,
}

/// Middleware: roda depois do `auth_guard` e antes de qualquer acesso com chave de tenant.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let AuthenticatedUser(identity) = request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or(AppError::InvalidToken)?;

    let scope = requested_scope(request.headers(), request.uri());
    let path = request.uri().path().to_owned();
    // Sem organização explícita, vale a do token
    let org_id = scope.org_id.unwrap_or_else(|| identity.org_id.clone());

    let tenant = app_state
        .access_gate
        .authorize(&identity, &org_id, scope.tenant_id.as_deref(), &path)
        .await?;

    request.extensions_mut().insert(OrgContext { org_id, tenant });
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for OrgContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OrgContext>()
            .cloned()
            .ok_or_else(|| ApiError::bad_request("Contexto da organização não encontrado."))
    }
}

/// Extrator para rotas que exigem um tenant.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub org_id: String,
    pub tenant: Tenant,
}

impl TenantContext {
    pub fn id(&self) -> &str {
        &self.tenant.id
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OrgContext { org_id, tenant } = OrgContext::from_request_parts(parts, state).await?;

        match tenant {
            Some(tenant) => Ok(TenantContext { org_id, tenant }),
            None => Err(ApiError::bad_request(
                "O cabeçalho X-Tenant-ID (ou o parâmetro ?tenant=) é obrigatório.",
            )),
        }
    }
}
