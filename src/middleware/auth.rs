// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    models::auth::{Claims, Identity},
};

/// Cookie que o portal usa quando não manda `Authorization`.
pub const AUTH_COOKIE: &str = "auth-token";

/// Token da requisição: `Authorization: Bearer` primeiro, depois o cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Só verifica. A emissão do token é de outro serviço.
pub fn decode_identity(token: &str, jwt_secret: &str) -> Result<Identity, AppError> {
    let validation = Validation::default();
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(jwt_secret.as_ref()), &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejeitado");
            AppError::InvalidToken
        })?;

    Ok(Identity::from(token_data.claims))
}

// O middleware em si
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or(AppError::InvalidToken)?;
    let identity = decode_identity(&token, &app_state.jwt_secret)?;

    // Insere a identidade nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    use crate::models::tenancy::OrgRole;

    const SECRET: &str = "segredo-de-teste";

    fn token(secret: &str, expires_in: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            user_id: Uuid::new_v4(),
            email: "ana@acme.test".into(),
            name: "Ana".into(),
            org_id: "Ab3_x-9Z".into(),
            role: OrgRole::Admin,
            iat: now.timestamp() as usize,
            exp: (now + expires_in).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[test]
    fn valid_token_yields_identity() {
        let identity = decode_identity(&token(SECRET, Duration::hours(1)), SECRET).unwrap();
        assert_eq!(identity.org_id, "Ab3_x-9Z");
        assert_eq!(identity.role, OrgRole::Admin);
    }

    #[test]
    fn extra_claims_from_the_issuer_are_ignored() {
        let now = Utc::now();
        let claims = serde_json::json!({
            "userId": Uuid::new_v4(),
            "email": "ana@acme.test",
            "name": "Ana",
            "orgId": "Ab3_x-9Z",
            "role": "member",
            "defaultTenant": "acme",
            "iat": now.timestamp(),
            "exp": (now + Duration::hours(1)).timestamp(),
        });
        let raw = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_ref())).unwrap();

        let identity = decode_identity(&raw, SECRET).unwrap();
        assert_eq!(identity.org_id, "Ab3_x-9Z");
        assert_eq!(identity.role, OrgRole::Member);
    }

    #[test]
    fn wrong_secret_or_expired_token_is_rejected() {
        let forged = token("outro-segredo", Duration::hours(1));
        assert!(matches!(decode_identity(&forged, SECRET), Err(AppError::InvalidToken)));

        let expired = token(SECRET, Duration::hours(-2));
        assert!(matches!(decode_identity(&expired, SECRET), Err(AppError::InvalidToken)));
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth-token=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
