//! Escopo de tenant sobre conexões do pool.
//!
//! Toda leitura/escrita das tabelas com RLS passa por aqui: a conexão é
//! carimbada com `app.tenant_id` no checkout e o carimbo é removido antes
//! de a conexão voltar para o pool. Se a limpeza não puder acontecer
//! (erro, panic, future cancelado), a conexão física é descartada.

use futures::future::BoxFuture;
use sqlx::{
    pool::{PoolConnection, PoolConnectionMetadata},
    PgConnection, PgPool, Postgres,
};

use crate::common::error::AppError;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---

/// Uma conexão do pool carimbada com um tenant.
///
/// Use [`TenantScope::release`] para devolvê-la limpa. Soltar o escopo sem
/// `release` marca a conexão para ser fechada em vez de voltar ao pool.
pub struct TenantScope {
    conn: PoolConnection<Postgres>,
    tenant_id: String,
    cleared: bool,
}

impl TenantScope {
    /// Adquire uma conexão da pool e define o tenant da sessão.
    pub async fn acquire(pool: &PgPool, tenant_id: &str) -> Result<Self, AppError> {
        // 1. Adquire conexão
        let conn = pool.acquire().await?;

        // A partir daqui o Drop cuida da conexão, mesmo se o SET falhar no meio.
        let mut scope = Self {
            conn,
            tenant_id: tenant_id.to_owned(),
            cleared: false,
        };

        // 2. Define Tenant ID
        if let Err(e) = sqlx::query("SELECT set_tenant_context($1)")
            .bind(tenant_id)
            .execute(&mut *scope.conn)
            .await
        {
            tracing::warn!(tenant_id, error = %e, "Falha ao carimbar a conexão com o tenant");
            scope.release().await;
            return Err(e.into());
        }

        Ok(scope)
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Limpa o carimbo e devolve a conexão ao pool.
    ///
    /// Se a limpeza falhar a conexão é descartada (o Drop vê `cleared == false`).
    pub async fn release(mut self) {
        match sqlx::query("SELECT clear_tenant_context()")
            .execute(&mut *self.conn)
            .await
        {
            Ok(_) => self.cleared = true,
            Err(e) => {
                tracing::error!(
                    tenant_id = %self.tenant_id,
                    error = %e,
                    "🔥 Falha ao limpar o contexto do tenant; a conexão será descartada"
                );
            }
        }
    }
}

impl Drop for TenantScope {
    fn drop(&mut self) {
        if !self.cleared {
            // Não dá para fazer `.await` aqui: fecha a conexão física e o carimbo morre com ela.
            tracing::warn!(
                tenant_id = %self.tenant_id,
                "Escopo de tenant encerrado sem limpeza; conexão descartada do pool"
            );
            self.conn.close_on_drop();
        }
    }
}

/// Executa `op` numa conexão carimbada com `tenant_id`.
///
/// O carimbo é removido em todos os caminhos de saída. Um erro da limpeza é
/// logado e a conexão descartada, mas não substitui o resultado de `op`.
pub async fn with_tenant_scope<T, F>(pool: &PgPool, tenant_id: &str, op: F) -> Result<T, AppError>
where
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, AppError>>,
{
    let mut scope = TenantScope::acquire(pool, tenant_id).await?;

    let result = op(scope.connection()).await;

    if let Err(e) = &result {
        tracing::debug!(tenant_id, error = %e, "Operação falhou dentro do escopo do tenant");
    }

    scope.release().await;
    result
}

/// Lê o carimbo atual da conexão (`None` quando não há tenant ativo).
pub async fn current_tenant_stamp(conn: &mut PgConnection) -> Result<Option<String>, AppError> {
    let stamp: Option<String> = sqlx::query_scalar("SELECT current_setting('app.tenant_id', true)")
        .fetch_one(conn)
        .await?;

    Ok(stamp.filter(|s| !s.is_empty()))
}

/// Hook `after_release` do pool: última barreira contra devolver conexão carimbada.
///
/// Retorna `Ok(false)` (fecha a conexão) se ainda houver tenant ativo.
pub fn reject_stamped_connection(
    conn: &mut PgConnection,
    _meta: PoolConnectionMetadata,
) -> BoxFuture<'_, Result<bool, sqlx::Error>> {
    Box::pin(async move {
        let stamp: Option<String> =
            sqlx::query_scalar("SELECT current_setting('app.tenant_id', true)")
                .fetch_one(&mut *conn)
                .await?;

        match stamp.as_deref() {
            None | Some("") => Ok(true),
            Some(tenant_id) => {
                tracing::error!(tenant_id, "🔥 Conexão voltou ao pool ainda carimbada; descartando");
                Ok(false)
            }
        }
    })
}
