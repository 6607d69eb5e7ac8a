// src/services/proposal_service.rs

use std::{future::Future, sync::Arc};

use futures::future::try_join_all;
use validator::Validate;

use crate::{
    catalog::TemplateCatalog,
    common::{error::AppError, validation::ensure_slug},
    db::{versioned_repo::LiveSlugRow, EntityKey, OrganizationRepository, VersionedRepository},
    models::{
        proposal::{
            BulkDeleteFailure, BulkDeleteReport, ComposedProposal, DeleteTarget, LiveSlugOwner,
            ProposalContentData, ProposalLayoutData, ProposalSummary, ReferencesCatalog, TenantProfileData,
            Versioned,
        },
        tenancy::Tenant,
    },
    services::{composition, entity_store::EntityStore},
};

// ---
// Exclusão item a item (usada pelo bulk delete)
// ---

/// Remove uma linha de conteúdo. `Ok(false)` = a linha não existia.
pub trait ContentRemover {
    fn remove(&mut self, target: &DeleteTarget) -> impl Future<Output = Result<bool, AppError>> + Send;
}

/// Remove cada alvo sem abortar nos erros; cada falha vira um item do relatório.
pub async fn delete_each<R: ContentRemover>(remover: &mut R, targets: &[DeleteTarget]) -> BulkDeleteReport {
    let mut report = BulkDeleteReport::default();

    for target in targets {
        let outcome = match target.validate() {
            Ok(()) => remover.remove(target).await,
            Err(e) => Err(AppError::ValidationError(e)),
        };

        match outcome {
            Ok(true) => report.deleted_count += 1,
            Ok(false) => {
                tracing::debug!(slug = %target.slug, is_draft = target.is_draft, "Nada para excluir");
            }
            Err(e) => {
                tracing::warn!(slug = %target.slug, is_draft = target.is_draft, error = ?e, "Falha ao excluir item");
                report.errors.push(BulkDeleteFailure {
                    slug: target.slug.clone(),
                    is_draft: target.is_draft,
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

struct TenantContentRemover<'a> {
    store: &'a EntityStore,
    tenant_id: &'a str,
}

impl ContentRemover for TenantContentRemover<'_> {
    fn remove(&mut self, target: &DeleteTarget) -> impl Future<Output = Result<bool, AppError>> + Send {
        self.store.delete_content(self.tenant_id, &target.slug, target.is_draft)
    }
}

/// Escolhe o dono de um slug publicado: o mais recente vence.
///
/// Mais de um dono é um problema de qualidade de dados, não uma falha.
pub fn pick_live_owner(slug: &str, mut rows: Vec<LiveSlugRow>) -> Result<LiveSlugOwner, AppError> {
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut rows = rows.into_iter();
    let winner = rows.next().ok_or_else(|| AppError::NotFound {
        entity: "Proposta publicada",
        key: slug.to_string(),
    })?;
    let competing_tenants: Vec<String> = rows.map(|r| r.tenant_id).collect();

    if !competing_tenants.is_empty() {
        tracing::warn!(
            slug,
            chosen_tenant = %winner.tenant_id,
            competing_tenants = ?competing_tenants,
            "Slug publicado por mais de um tenant; usando o mais recente"
        );
    }

    Ok(LiveSlugOwner {
        tenant_id: winner.tenant_id,
        updated_at: winner.updated_at,
        competing_tenants,
    })
}

#[derive(Clone)]
pub struct ProposalService {
    store: EntityStore,
    versioned_repo: VersionedRepository,
    org_repo: OrganizationRepository,
    catalog: Arc<TemplateCatalog>,
}

impl ProposalService {
    pub fn new(
        store: EntityStore,
        versioned_repo: VersionedRepository,
        org_repo: OrganizationRepository,
        catalog: Arc<TemplateCatalog>,
    ) -> Self {
        Self { store, versioned_repo, org_repo, catalog }
    }

    pub async fn get_content(
        &self,
        tenant_id: &str,
        slug: &str,
        is_draft: bool,
    ) -> Result<Versioned<ProposalContentData>, AppError> {
        ensure_slug(slug)?;
        let key = EntityKey::content(slug, is_draft);

        self.store
            .get(tenant_id, key.clone())
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: key.kind.label(),
                key: key.describe(tenant_id),
            })
    }

    pub async fn save_draft(
        &self,
        tenant_id: &str,
        slug: &str,
        data: &ProposalContentData,
    ) -> Result<Versioned<ProposalContentData>, AppError> {
        ensure_slug(slug)?;
        self.store.save_content(tenant_id, slug, true, data).await
    }

    /// Grava a linha publicada com `data`. O rascunho não é tocado.
    pub async fn publish(
        &self,
        tenant_id: &str,
        slug: &str,
        data: &ProposalContentData,
    ) -> Result<Versioned<ProposalContentData>, AppError> {
        ensure_slug(slug)?;
        let live = self.store.save_content(tenant_id, slug, false, data).await?;

        tracing::info!(tenant_id, slug, "📢 Proposta publicada");
        Ok(live)
    }

    pub async fn delete_one(&self, tenant_id: &str, slug: &str, is_draft: bool) -> Result<bool, AppError> {
        ensure_slug(slug)?;
        self.store.delete_content(tenant_id, slug, is_draft).await
    }

    pub async fn delete_many(&self, tenant_id: &str, targets: &[DeleteTarget]) -> BulkDeleteReport {
        let mut remover = TenantContentRemover { store: &self.store, tenant_id };
        let report = delete_each(&mut remover, targets).await;

        tracing::info!(
            tenant_id,
            requested = targets.len(),
            deleted = report.deleted_count,
            failed = report.errors.len(),
            "Exclusão em lote concluída"
        );
        report
    }

    pub async fn find_tenant_for_live_slug(&self, slug: &str) -> Result<LiveSlugOwner, AppError> {
        ensure_slug(slug)?;
        let rows = self.versioned_repo.find_live_slug_owners(slug).await?;
        pick_live_owner(slug, rows)
    }

    /// Modelo de renderização completo de uma proposta do tenant.
    pub async fn render(&self, tenant_id: &str, slug: &str, is_draft: bool) -> Result<ComposedProposal, AppError> {
        ensure_slug(slug)?;

        // 1. As quatro leituras são independentes: cada uma na sua conexão carimbada
        let (profile, references, layout, content) = tokio::try_join!(
            self.store.get_preferring::<TenantProfileData>(tenant_id, EntityKey::profile(is_draft)),
            self.store.get_preferring::<ReferencesCatalog>(tenant_id, EntityKey::references(is_draft)),
            self.store.get_preferring::<ProposalLayoutData>(tenant_id, EntityKey::layout(is_draft)),
            self.store.get_content(tenant_id, slug, is_draft),
        )?;

        // 2. Ausência vira padrão vazio
        let profile = profile.map(|p| p.data).unwrap_or_default();
        let references = references.map(|r| r.data).unwrap_or_default();
        let layout = composition::effective_layout(layout.map(|l| l.data), &profile);
        let (content, updated_at) = match content {
            Some(c) => (c.data, Some(c.updated_at)),
            None => (ProposalContentData::new(), None),
        };

        // 3. Composição
        let sections = composition::resolve(&self.catalog, &layout, &content, &profile, &references);

        Ok(ComposedProposal {
            tenant_id: tenant_id.to_string(),
            slug: slug.to_string(),
            is_draft,
            updated_at,
            sections,
        })
    }

    /// Renderização pública: o visitante só conhece o slug.
    pub async fn render_live(&self, slug: &str) -> Result<ComposedProposal, AppError> {
        let owner = self.find_tenant_for_live_slug(slug).await?;
        self.render(&owner.tenant_id, slug, false).await
    }

    /// Propostas de um tenant, ou de todos os tenants da organização.
    pub async fn list_proposals(
        &self,
        org_id: &str,
        tenant: Option<&Tenant>,
        is_draft: Option<bool>,
    ) -> Result<Vec<ProposalSummary>, AppError> {
        let tenants = match tenant {
            Some(t) => vec![t.clone()],
            None => self.org_repo.list_tenants(org_id).await?,
        };

        let per_tenant = try_join_all(tenants.iter().map(|t| async move {
            let mut rows = self.store.list_content(&t.id, is_draft).await?;
            for row in &mut rows {
                row.tenant_name = Some(t.name.clone());
            }
            Ok::<_, AppError>(rows)
        }))
        .await?;

        let mut summaries: Vec<ProposalSummary> = per_tenant.into_iter().flatten().collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::{HashMap, HashSet};

    /// Remoção em memória; slugs em `broken` falham como se o banco caísse.
    #[derive(Default)]
    struct FakeRemover {
        rows: HashMap<(String, bool), ()>,
        broken: HashSet<String>,
    }

    impl ContentRemover for FakeRemover {
        fn remove(&mut self, target: &DeleteTarget) -> impl Future<Output = Result<bool, AppError>> + Send {
            let result = if self.broken.contains(&target.slug) {
                Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
            } else {
                Ok(self.rows.remove(&(target.slug.clone(), target.is_draft)).is_some())
            };
            async move { result }
        }
    }

    fn target(slug: &str, is_draft: bool) -> DeleteTarget {
        DeleteTarget { slug: slug.into(), is_draft }
    }

    #[tokio::test]
    async fn bulk_delete_keeps_going_after_a_failure() {
        let mut remover = FakeRemover::default();
        for slug in ["one", "two", "three"] {
            remover.rows.insert((slug.to_string(), true), ());
        }
        remover.broken.insert("two".into());

        let targets = vec![target("one", true), target("two", true), target("three", true)];
        let report = delete_each(&mut remover, &targets).await;

        assert_eq!(report.deleted_count, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].slug, "two");
        assert_eq!(report.errors[0].kind, "internal");
        assert!(report.is_partial_failure());

        assert!(!remover.rows.contains_key(&("one".to_string(), true)));
        assert!(!remover.rows.contains_key(&("three".to_string(), true)));
        assert!(remover.rows.contains_key(&("two".to_string(), true)));
    }

    #[tokio::test]
    async fn bulk_delete_skips_absent_rows_and_reports_bad_slugs() {
        let mut remover = FakeRemover::default();
        remover.rows.insert(("live".to_string(), false), ());

        let targets = vec![target("live", true), target("live", false), target("a/b", false)];
        let report = delete_each(&mut remover, &targets).await;

        assert_eq!(report.deleted_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, "validation");
    }

    #[test]
    fn most_recent_live_owner_wins() {
        let now = Utc::now();
        let rows = vec![
            LiveSlugRow { tenant_id: "old".into(), updated_at: now - Duration::hours(2) },
            LiveSlugRow { tenant_id: "new".into(), updated_at: now },
            LiveSlugRow { tenant_id: "mid".into(), updated_at: now - Duration::hours(1) },
        ];

        let owner = pick_live_owner("q3", rows).unwrap();

        assert_eq!(owner.tenant_id, "new");
        assert_eq!(owner.competing_tenants, vec!["mid".to_string(), "old".to_string()]);
    }

    #[test]
    fn unpublished_slug_is_not_found() {
        let single = vec![LiveSlugRow { tenant_id: "acme".into(), updated_at: Utc::now() }];
        assert!(pick_live_owner("q3", single).unwrap().competing_tenants.is_empty());

        assert!(matches!(pick_live_owner("q3", vec![]), Err(AppError::NotFound { .. })));
    }
}
