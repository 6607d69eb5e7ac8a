// src/common/validation.rs

use validator::{Validate, ValidationError};

use crate::common::error::AppError;

pub const ORG_ID_LEN: usize = 8;
pub const MAX_SLUG_LEN: usize = 200;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// IDs de organização: exatamente 8 caracteres em `[A-Za-z0-9_-]`.
pub fn is_valid_org_id(id: &str) -> bool {
    id.len() == ORG_ID_LEN && id.chars().all(is_id_char)
}

pub fn ensure_org_id(id: &str) -> Result<(), AppError> {
    if is_valid_org_id(id) {
        Ok(())
    } else {
        Err(AppError::InvalidOrgId(id.to_string()))
    }
}

#[derive(Validate)]
struct SlugCheck {
    #[validate(custom(function = "validate_slug"))]
    slug: String,
}

/// Slug vindo da rota (não passa por um payload com `Validate`).
pub fn ensure_slug(slug: &str) -> Result<(), AppError> {
    SlugCheck { slug: slug.to_owned() }.validate()?;
    Ok(())
}

// ---
// Validações customizadas (validator)
// ---
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let trimmed = slug.trim();

    if trimmed.is_empty() || trimmed.len() != slug.len() {
        let mut err = ValidationError::new("slug");
        err.message = Some("O slug não pode ser vazio nem ter espaços nas pontas.".into());
        return Err(err);
    }

    if slug.len() > MAX_SLUG_LEN || slug.contains('/') {
        let mut err = ValidationError::new("slug");
        err.add_param("max".into(), &MAX_SLUG_LEN);
        err.message = Some("O slug é longo demais ou contém '/'.".into());
        return Err(err);
    }

    Ok(())
}
