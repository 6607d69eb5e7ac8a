//! Catálogo estático de templates de seção.
//!
//! Somente leitura: mapeia `(tipo, variante)` para os `defaults` e os
//! metadados de campos que o portal usa para gerar formulários.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Color,
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub name: String,
    pub label: String,
    /// Tipo dos itens quando `kind == list` ("string" ou "object").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VariantTemplate {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub defaults: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionTemplate {
    pub id: String,
    pub label: String,
    pub variants: Vec<VariantTemplate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateCatalog {
    sections: BTreeMap<String, SectionTemplate>,
}

impl TemplateCatalog {
    pub fn lookup(&self, section_type: &str, variant: &str) -> Option<&VariantTemplate> {
        self.sections
            .get(section_type)?
            .variants
            .iter()
            .find(|v| v.id == variant)
    }

    pub fn sections(&self) -> impl Iterator<Item = &SectionTemplate> {
        self.sections.values()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Carrega um catálogo customizado de um arquivo JSON.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            path = %path.display(),
            sections = catalog.sections.len(),
            "Catálogo de seções carregado"
        );
        Ok(catalog)
    }

    /// O catálogo embutido (o mesmo que o portal usa).
    pub fn builtin() -> Self {
        let mut sections = BTreeMap::new();

        let mut add = |id: &str, label: &str, variants: Vec<VariantTemplate>| {
            sections.insert(
                id.to_string(),
                SectionTemplate {
                    id: id.to_string(),
                    label: label.to_string(),
                    variants,
                },
            );
        };

        add(
            "Hero",
            "Hero",
            vec![
                variant(
                    "simple",
                    "Simple",
                    vec![text("title", "Title"), text("subtitle", "Subtitle"), color("color", "Background")],
                    json!({ "color": "{{branding.colors.primary}}" }),
                ),
                variant(
                    "imageLeft",
                    "Image Left",
                    vec![text("title", "Title"), text("subtitle", "Subtitle"), color("color", "Background")],
                    json!({ "color": "{{branding.colors.secondary}}" }),
                ),
                variant(
                    "backgroundImg",
                    "Background Image",
                    vec![
                        text("eyebrow", "Eyebrow Text"),
                        text("title", "Title"),
                        text("subtitle", "Subtitle"),
                        text("backgroundImage", "Background Image URL"),
                        text("ctaText", "CTA Button Text"),
                        text("ctaLink", "CTA Button Link"),
                    ],
                    json!({
                        "eyebrow": "Eyebrow text goes here",
                        "title": "Hero title goes here",
                        "subtitle": "Hero subtitle goes here"
                    }),
                ),
            ],
        );
        add(
            "Problem",
            "Problem Statement",
            vec![
                variant("concise", "Concise", vec![list("bullets", "Bullets", "string")], json!({})),
                variant("detailed", "Detailed", vec![list("bullets", "Bullets", "string")], json!({})),
            ],
        );
        add(
            "CustomerStories",
            "Customer Stories",
            vec![variant(
                "list",
                "List",
                vec![
                    list("include", "Include IDs", "string"),
                    list("exclude", "Exclude IDs", "string"),
                    text("useCollection", "Use collection"),
                ],
                json!({}),
            )],
        );
        add(
            "Overview",
            "Overview",
            vec![variant(
                "opportunity",
                "Opportunity",
                vec![
                    text("title", "Title"),
                    text("description", "Description"),
                    list("kpis", "KPIs", "object"),
                    text("imageUrl", "Image URL"),
                    text("imageAlt", "Image Alt Text"),
                ],
                json!({}),
            )],
        );
        add(
            "Objectives",
            "Objectives",
            vec![variant(
                "strategy",
                "Strategy",
                vec![text("title", "Title"), text("subtitle", "Subtitle"), list("objectives", "Objectives", "object")],
                json!({}),
            )],
        );
        add(
            "Campaign",
            "Campaign",
            vec![variant(
                "overview",
                "Overview",
                vec![
                    text("activateTitle", "Activate Title"),
                    text("activateDescription", "Activate Description"),
                    list("activateBullets", "Activate Bullets", "string"),
                    text("activateLink", "Activate Link"),
                    text("amplifyTitle", "Amplify Title"),
                    text("amplifyDescription", "Amplify Description"),
                    list("amplifyBullets", "Amplify Bullets", "string"),
                    text("amplifyLink", "Amplify Link"),
                ],
                json!({}),
            )],
        );
        add(
            "Activation",
            "Activation",
            vec![variant(
                "details",
                "Details",
                vec![
                    text("title", "Title"),
                    list("details", "Details", "object"),
                    list("themes", "Conference Themes", "object"),
                ],
                json!({}),
            )],
        );
        add(
            "Timeline",
            "Timeline",
            vec![variant(
                "steps",
                "Steps",
                vec![text("title", "Title"), list("steps", "Steps", "object")],
                json!({}),
            )],
        );
        add(
            "Amplification",
            "Amplification",
            vec![variant(
                "content",
                "Content",
                vec![
                    text("leftTitle", "Left Title"),
                    text("leftDescription", "Left Description"),
                    text("leftNote", "Left Note"),
                    text("rightTitle", "Right Title"),
                    text("rightDescription", "Right Description"),
                    list("rightBullets", "Right Bullets", "string"),
                ],
                json!({}),
            )],
        );
        add("Measurement", "Measurement", vec![two_columns("success", "Success")]);
        add("Roles", "Roles", vec![two_columns("responsibilities", "Responsibilities")]);
        add(
            "Budget",
            "Budget",
            vec![variant(
                "pricing",
                "Pricing",
                vec![text("title", "Title"), list("tiers", "Pricing Tiers", "object")],
                json!({}),
            )],
        );
        add(
            "Contact",
            "Contact",
            vec![variant(
                "info",
                "Info",
                vec![
                    text("title", "Title"),
                    text("company", "Company"),
                    text("contactName", "Contact Name"),
                    text("contactTitle", "Contact Title"),
                    text("contactEmail", "Contact Email"),
                    list("assets", "Assets", "object"),
                ],
                json!({}),
            )],
        );

        Self { sections }
    }
}

// Atalhos para montar o catálogo embutido

fn text(name: &str, label: &str) -> FieldSpec {
    FieldSpec { kind: FieldKind::String, name: name.into(), label: label.into(), of: None }
}

fn color(name: &str, label: &str) -> FieldSpec {
    FieldSpec { kind: FieldKind::Color, name: name.into(), label: label.into(), of: None }
}

fn list(name: &str, label: &str, of: &str) -> FieldSpec {
    FieldSpec { kind: FieldKind::List, name: name.into(), label: label.into(), of: Some(of.into()) }
}

fn variant(id: &str, label: &str, fields: Vec<FieldSpec>, defaults: Value) -> VariantTemplate {
    let defaults = match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    VariantTemplate { id: id.into(), label: label.into(), fields, defaults }
}

fn two_columns(id: &str, label: &str) -> VariantTemplate {
    variant(
        id,
        label,
        vec![
            text("leftTitle", "Left Title"),
            list("leftBullets", "Left Bullets", "string"),
            text("rightTitle", "Right Title"),
            list("rightBullets", "Right Bullets", "string"),
        ],
        json!({}),
    )
}
