// src/models/proposal.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_slug;

// =========================================================================
//  LINHAS VERSIONADAS (o que o banco guarda)
// =========================================================================

/// Linha crua de qualquer uma das quatro tabelas versionadas.
#[derive(Debug, Clone, FromRow)]
pub struct VersionedRow {
    pub id: Uuid,
    pub tenant_id: String,
    pub slug: Option<String>,
    pub data: Value,
    pub version: String,
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VersionedRow {
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<Versioned<T>, serde_json::Error> {
        Ok(Versioned {
            data: serde_json::from_value(self.data)?,
            id: self.id,
            tenant_id: self.tenant_id,
            slug: self.slug,
            version: self.version,
            is_draft: self.is_draft,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Uma entidade versionada já com `data` tipado.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioned<T> {
    pub id: Uuid,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub data: T,
    pub version: String,
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =========================================================================
//  PERFIL DO TENANT (branding + layout padrão)
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrandColors {
    #[serde(default)]
    #[schema(example = "#0B5FFF")]
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub colors: BrandColors,
    // Tokens extras de branding (fontes, slogans...) continuam disponíveis para {{branding.*}}
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantProfileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_version: Option<String>,
    #[serde(default)]
    pub branding: Branding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub layout_defaults: Option<ProposalLayoutData>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, bool>,
}

// =========================================================================
//  REFERÊNCIAS (depoimentos / cases + coleções nomeadas)
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceMetric {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceItem {
    #[validate(length(min = 1, message = "O ID da referência é obrigatório."))]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<ReferenceMetric>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferencesCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_version: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub references: Vec<ReferenceItem>,
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<String>>,
}

/// O que uma seção `CustomerStories` pede ao catálogo de referências.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSelection {
    #[serde(default)]
    pub use_collection: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

// =========================================================================
//  LAYOUT (o esqueleto da proposta)
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionEntry {
    #[serde(rename = "type")]
    #[schema(example = "Hero")]
    #[validate(length(min = 1, message = "O tipo da seção é obrigatório."))]
    pub section_type: String,
    #[schema(example = "simple")]
    #[validate(length(min = 1, message = "A variante da seção é obrigatória."))]
    pub variant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub props: Option<Map<String, Value>>,
}

impl SectionEntry {
    /// `enabled` ausente conta como habilitado.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalLayoutData {
    #[serde(default)]
    #[validate(nested)]
    pub sections: Vec<SectionEntry>,
}

// =========================================================================
//  CONTEÚDO (os dados de uma proposta, por tipo de seção)
// =========================================================================

/// `sectionType -> qualquer JSON`
pub type ProposalContentData = Map<String, Value>;

/// Linha da listagem de propostas.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub slug: String,
    pub title: String,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    pub is_draft: bool,
    pub updated_at: DateTime<Utc>,
}

/// Título de exibição: `Hero.title`, `title`, `sections[0].props.title` e por fim o próprio slug.
pub fn proposal_title(slug: &str, data: &Value) -> String {
    ["/Hero/title", "/title", "/sections/0/props/title"]
        .iter()
        .filter_map(|path| data.pointer(path).and_then(Value::as_str))
        .find(|t| !t.is_empty())
        .unwrap_or(slug)
        .to_string()
}

// =========================================================================
//  CICLO DE VIDA (exclusões)
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTarget {
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    pub is_draft: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteFailure {
    pub slug: String,
    pub is_draft: bool,
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteReport {
    pub deleted_count: usize,
    pub errors: Vec<BulkDeleteFailure>,
}

impl BulkDeleteReport {
    pub fn is_partial_failure(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Dono de um slug publicado. `competing_tenants` != vazio indica slug ambíguo.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveSlugOwner {
    pub tenant_id: String,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub competing_tenants: Vec<String>,
}

// =========================================================================
//  COMPOSIÇÃO (o que o renderizador consome)
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderModel {
    #[serde(rename_all = "camelCase")]
    Section {
        #[serde(rename = "type")]
        section_type: String,
        variant: String,
        #[schema(value_type = Object)]
        props: Value,
    },
    /// Seção sem template no catálogo: só ela degrada.
    #[serde(rename_all = "camelCase")]
    MissingTemplate {
        #[serde(rename = "type")]
        section_type: String,
        variant: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComposedProposal {
    pub tenant_id: String,
    pub slug: String,
    pub is_draft: bool,
    /// `None` quando ainda não há conteúdo salvo para o slug.
    pub updated_at: Option<DateTime<Utc>>,
    pub sections: Vec<RenderModel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn title_prefers_hero_title() {
        let data = json!({ "Hero": { "title": "Q3 Renewal" }, "title": "fallback" });
        assert_eq!(proposal_title("q3", &data), "Q3 Renewal");

        let data = json!({ "title": "Plain" });
        assert_eq!(proposal_title("q3", &data), "Plain");

        let data = json!({ "sections": [{ "type": "Hero", "props": { "title": "From layout" } }] });
        assert_eq!(proposal_title("q3", &data), "From layout");

        // Título vazio não conta
        let data = json!({ "Hero": { "title": "" }, "title": "Plain" });
        assert_eq!(proposal_title("q3", &data), "Plain");

        assert_eq!(proposal_title("q3", &json!({})), "q3");
    }

    #[test]
    fn absent_enabled_counts_as_enabled() {
        let entry: SectionEntry =
            serde_json::from_value(json!({ "type": "Hero", "variant": "simple" })).unwrap();
        assert!(entry.is_enabled());

        let entry: SectionEntry = serde_json::from_value(
            json!({ "type": "Hero", "variant": "simple", "enabled": false }),
        )
        .unwrap();
        assert!(!entry.is_enabled());
    }

    #[test]
    fn layout_entries_need_type_and_variant() {
        let layout: ProposalLayoutData = serde_json::from_value(json!({
            "sections": [{ "type": "Hero", "variant": "simple" }, { "type": "", "variant": "list" }]
        }))
        .unwrap();
        assert!(layout.validate().is_err());

        let ok = ProposalLayoutData { sections: vec![layout.sections[0].clone()] };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn render_model_is_tagged_by_kind() {
        let missing = RenderModel::MissingTemplate {
            section_type: "Gallery".into(),
            variant: "grid".into(),
            message: "Missing Gallery.grid".into(),
        };
        let value = serde_json::to_value(&missing).unwrap();
        assert_eq!(value["kind"], "missingTemplate");
        assert_eq!(value["type"], "Gallery");
    }
}
