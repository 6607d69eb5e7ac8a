// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::ApiError,
    middleware::auth::AuthenticatedUser,
    models::tenancy::OrgRole,
    services::access_gate::require_role,
};

/// 1. O Trait que define o papel mínimo de uma rota
pub trait RoleDef: Send + Sync + 'static {
    fn minimum() -> OrgRole;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if let Err(e) = require_role(&identity, T::minimum()) {
            tracing::warn!(
                target: "audit",
                user_id = %identity.user_id,
                user_org = %identity.org_id,
                path = parts.uri.path(),
                kind = e.kind(),
                "Papel insuficiente"
            );
            return Err(e.into());
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct MemberRole;
impl RoleDef for MemberRole {
    fn minimum() -> OrgRole { OrgRole::Member }
}

pub struct AdminRole;
impl RoleDef for AdminRole {
    fn minimum() -> OrgRole { OrgRole::Admin }
}
