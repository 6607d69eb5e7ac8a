//! Testes contra um Postgres real. Rodam só com `DATABASE_URL` definida.
//!
//! Use um papel sem `BYPASSRLS` (e que não seja superusuário) para que as
//! políticas de RLS também sejam exercitadas.

use proposals_backend::{
    catalog::TemplateCatalog,
    common::{
        db_utils::{current_tenant_stamp, reject_stamped_connection, with_tenant_scope, TenantScope},
        error::AppError,
    },
    config::AppState,
    models::proposal::{DeleteTarget, ProposalContentData, ProposalLayoutData, RenderModel, SectionEntry, TenantProfileData},
};
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

struct Fixture {
    state: AppState,
    tenant_a: String,
    tenant_b: String,
}

fn content(value: Value) -> ProposalContentData {
    match value {
        Value::Object(map) => map,
        _ => ProposalContentData::new(),
    }
}

async fn setup(max_connections: u32) -> Option<Fixture> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL não definida; pulando teste de banco");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .after_release(reject_stamped_connection)
        .connect(&url)
        .await
        .expect("conexão com o banco de teste");
    sqlx::migrate!().run(&pool).await.expect("migrações");

    let run = Uuid::new_v4().simple().to_string();
    let org_id = run[..8].to_string();
    let tenant_a = format!("a-{run}");
    let tenant_b = format!("b-{run}");

    seed(&pool, &org_id, &[&tenant_a, &tenant_b]).await;

    Some(Fixture {
        state: AppState::from_parts(pool, "segredo-de-teste".into(), TemplateCatalog::builtin()),
        tenant_a,
        tenant_b,
    })
}

async fn seed(pool: &PgPool, org_id: &str, tenants: &[&str]) {
    sqlx::query("INSERT INTO organizations (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(org_id)
        .bind(format!("Org {org_id}"))
        .execute(pool)
        .await
        .expect("organização");

    for tenant in tenants {
        sqlx::query("INSERT INTO tenants (id, name, org_id) VALUES ($1, $2, $3)")
            .bind(tenant)
            .bind(tenant.to_uppercase())
            .bind(org_id)
            .execute(pool)
            .await
            .expect("tenant");
    }
}

#[tokio::test]
async fn interleaved_tenants_on_one_connection_stay_isolated() {
    let Some(fx) = setup(1).await else { return };
    let store = &fx.state.entity_store;

    store
        .save_content(&fx.tenant_a, "shared", true, &content(json!({ "owner": "a" })))
        .await
        .unwrap();
    store
        .save_content(&fx.tenant_b, "shared", true, &content(json!({ "owner": "b" })))
        .await
        .unwrap();

    // A, B, A disputando a única conexão do pool
    let (first_a, only_b, second_a) = tokio::join!(
        store.get_content(&fx.tenant_a, "shared", true),
        store.get_content(&fx.tenant_b, "shared", true),
        store.get_content(&fx.tenant_a, "shared", true),
    );

    assert_eq!(first_a.unwrap().unwrap().data["owner"], "a");
    assert_eq!(only_b.unwrap().unwrap().data["owner"], "b");
    assert_eq!(second_a.unwrap().unwrap().data["owner"], "a");

    let listed = store.list_content(&fx.tenant_a, None).await.unwrap();
    assert!(listed.iter().all(|s| s.tenant_id == fx.tenant_a));

    // B não enxerga nem remove a linha de A
    assert!(store.get_content(&fx.tenant_b, "only-a", true).await.unwrap().is_none());
    store
        .save_content(&fx.tenant_a, "only-a", true, &content(json!({})))
        .await
        .unwrap();
    assert!(!store.delete_content(&fx.tenant_b, "only-a", true).await.unwrap());
    assert!(store.get_content(&fx.tenant_a, "only-a", true).await.unwrap().is_some());
}

#[tokio::test]
async fn failing_operation_does_not_leave_a_stamp() {
    let Some(fx) = setup(1).await else { return };
    let pool = fx.state.db_pool.clone();

    let result: Result<(), AppError> = with_tenant_scope(&pool, &fx.tenant_a, |conn| {
        Box::pin(async move {
            sqlx::query("SELECT 1 / 0").execute(conn).await?;
            Ok(())
        })
    })
    .await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(current_tenant_stamp(&mut conn).await.unwrap(), None);
}

#[tokio::test]
async fn abandoned_scope_never_returns_a_stamped_connection() {
    let Some(fx) = setup(1).await else { return };
    let pool = fx.state.db_pool.clone();

    let mut scope = TenantScope::acquire(&pool, &fx.tenant_a).await.unwrap();
    assert_eq!(
        current_tenant_stamp(scope.connection()).await.unwrap().as_deref(),
        Some(fx.tenant_a.as_str())
    );
    // Simula cancelamento: o escopo some sem `release`
    drop(scope);

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(current_tenant_stamp(&mut conn).await.unwrap(), None);
}

#[tokio::test]
async fn rejected_stamp_releases_a_clean_connection() {
    let Some(fx) = setup(1).await else { return };
    let pool = fx.state.db_pool.clone();

    // set_tenant_context recusa tenant vazio
    let rejected = TenantScope::acquire(&pool, "").await;
    assert!(matches!(rejected, Err(AppError::DatabaseError(_))));

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(current_tenant_stamp(&mut conn).await.unwrap(), None);
}

#[tokio::test]
async fn failed_clear_discards_the_connection() {
    let Some(fx) = setup(1).await else { return };
    let pool = fx.state.db_pool.clone();

    // Transação abortada: o clear_tenant_context() do release também falha
    let result: Result<(), AppError> = with_tenant_scope(&pool, &fx.tenant_a, |conn| {
        Box::pin(async move {
            sqlx::Executor::execute(&mut *conn, sqlx::raw_sql("BEGIN")).await?;
            sqlx::query("SELECT 1 / 0").execute(&mut *conn).await?;
            Ok(())
        })
    })
    .await;
    assert!(matches!(result, Err(AppError::DatabaseError(_))));

    // A conexão seguinte é nova: sem carimbo e fora da transação abortada
    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(current_tenant_stamp(&mut conn).await.unwrap(), None);
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&mut *conn).await.unwrap();
    assert_eq!(one, 1);
}

#[tokio::test]
async fn pool_rejects_a_connection_stamped_outside_a_scope() {
    let Some(fx) = setup(1).await else { return };
    let pool = fx.state.db_pool.clone();

    let mut conn = pool.acquire().await.unwrap();
    sqlx::query("SELECT set_config('app.tenant_id', $1, false)")
        .bind(&fx.tenant_a)
        .execute(&mut *conn)
        .await
        .unwrap();
    drop(conn);

    // after_release fecha a conexão carimbada; o pool abre outra
    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(current_tenant_stamp(&mut conn).await.unwrap(), None);
}

#[tokio::test]
async fn upsert_twice_keeps_one_row_and_advances_updated_at() {
    let Some(fx) = setup(2).await else { return };
    let store = &fx.state.entity_store;
    let payload = content(json!({ "Hero": { "title": "Q3" } }));

    let first = store.save_content(&fx.tenant_a, "q3", true, &payload).await.unwrap();
    let second = store.save_content(&fx.tenant_a, "q3", true, &payload).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_at, second.created_at);
    assert_eq!(first.data, second.data);
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
async fn draft_and_live_never_overwrite_each_other() {
    let Some(fx) = setup(2).await else { return };
    let proposals = &fx.state.proposal_service;

    proposals
        .save_draft(&fx.tenant_a, "deal", &content(json!({ "title": "rascunho" })))
        .await
        .unwrap();
    proposals
        .publish(&fx.tenant_a, "deal", &content(json!({ "title": "publicado" })))
        .await
        .unwrap();

    let draft = proposals.get_content(&fx.tenant_a, "deal", true).await.unwrap();
    let live = proposals.get_content(&fx.tenant_a, "deal", false).await.unwrap();
    assert_eq!(draft.data["title"], "rascunho");
    assert_eq!(live.data["title"], "publicado");

    // Apagar o publicado não mexe no rascunho
    assert!(proposals.delete_one(&fx.tenant_a, "deal", false).await.unwrap());
    assert!(!proposals.delete_one(&fx.tenant_a, "deal", false).await.unwrap());
    assert!(proposals.get_content(&fx.tenant_a, "deal", true).await.is_ok());
}

#[tokio::test]
async fn most_recent_publisher_owns_a_shared_live_slug() {
    let Some(fx) = setup(2).await else { return };
    let proposals = &fx.state.proposal_service;
    let slug = format!("launch-{}", Uuid::new_v4().simple());

    proposals.publish(&fx.tenant_a, &slug, &content(json!({}))).await.unwrap();
    proposals.publish(&fx.tenant_b, &slug, &content(json!({}))).await.unwrap();

    let owner = proposals.find_tenant_for_live_slug(&slug).await.unwrap();
    assert_eq!(owner.tenant_id, fx.tenant_b);
    assert_eq!(owner.competing_tenants, vec![fx.tenant_a.clone()]);

    // Rascunhos nunca contam como publicados
    let draft_only = format!("draft-{}", Uuid::new_v4().simple());
    proposals.save_draft(&fx.tenant_a, &draft_only, &content(json!({}))).await.unwrap();
    assert!(matches!(
        proposals.find_tenant_for_live_slug(&draft_only).await,
        Err(AppError::NotFound { .. })
    ));
}

#[tokio::test]
async fn bulk_delete_reports_the_failed_item_and_removes_the_rest() {
    let Some(fx) = setup(2).await else { return };
    let proposals = &fx.state.proposal_service;

    for slug in ["one", "three"] {
        proposals.save_draft(&fx.tenant_a, slug, &content(json!({}))).await.unwrap();
    }

    let targets = vec![
        DeleteTarget { slug: "one".into(), is_draft: true },
        DeleteTarget { slug: "bad/slug".into(), is_draft: true },
        DeleteTarget { slug: "three".into(), is_draft: true },
    ];
    let report = proposals.delete_many(&fx.tenant_a, &targets).await;

    assert_eq!(report.deleted_count, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].slug, "bad/slug");

    for slug in ["one", "three"] {
        assert!(matches!(
            proposals.get_content(&fx.tenant_a, slug, true).await,
            Err(AppError::NotFound { .. })
        ));
    }
}

#[tokio::test]
async fn render_composes_stored_entities() {
    let Some(fx) = setup(4).await else { return };
    let store = &fx.state.entity_store;

    let profile: TenantProfileData = serde_json::from_value(json!({
        "branding": { "name": "Acme", "colors": { "primary": "#0B5FFF" } }
    }))
    .unwrap();
    store.save_profile(&fx.tenant_a, false, &profile).await.unwrap();

    let layout = ProposalLayoutData {
        sections: vec![
            SectionEntry { section_type: "Hero".into(), variant: "simple".into(), enabled: None, props: None },
            SectionEntry { section_type: "Gallery".into(), variant: "grid".into(), enabled: None, props: None },
        ],
    };
    store.save_layout(&fx.tenant_a, false, &layout).await.unwrap();

    fx.state
        .proposal_service
        .save_draft(&fx.tenant_a, "pitch", &content(json!({ "Hero": { "title": "Olá {{branding.name}}" } })))
        .await
        .unwrap();

    // Rascunho do conteúdo + perfil/layout publicados (não há rascunho deles)
    let composed = fx.state.proposal_service.render(&fx.tenant_a, "pitch", true).await.unwrap();

    assert!(composed.updated_at.is_some());
    assert_eq!(composed.sections.len(), 2);
    match &composed.sections[0] {
        RenderModel::Section { props, .. } => {
            assert_eq!(props["title"], "Olá Acme");
            assert_eq!(props["color"], "#0B5FFF");
        }
        other => panic!("seção inesperada: {other:?}"),
    }
    assert!(matches!(composed.sections[1], RenderModel::MissingTemplate { .. }));
}
