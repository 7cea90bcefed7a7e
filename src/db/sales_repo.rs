// src/db/sales_repo.rs
//
// Leitura do ledger de vendas, que pertence a outro módulo e pode não
// estar instalado nesta instância. A ausência da tabela (erro 42P01 do
// Postgres) é tratada como "sem dados", nunca como falha.

use crate::{
    common::error::AppError,
    models::sales::{RecentPurchase, SalesStats, SALE_STATUS_COMPLETED},
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Agregado de vendas concluídas do cliente, pelo NOME.
    /// Retorna None quando o módulo de vendas não está instalado.
    pub async fn stats_for_name(&self, customer_name: &str) -> Result<Option<SalesStats>, AppError> {
        let result = sqlx::query_as::<_, SalesStats>(
            r#"
            SELECT
                COUNT(*) AS visit_count,
                COALESCE(SUM(total), 0) AS total_spent,
                MAX(created_at) AS last_purchase_at
            FROM sales
            WHERE customer_name = $1 AND status = $2
            "#,
        )
        .bind(customer_name)
        .bind(SALE_STATUS_COMPLETED)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(stats) => Ok(Some(stats)),
            Err(e) if is_undefined_table(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Últimas compras concluídas do cliente, mais recentes primeiro.
    /// Lista vazia quando o ledger não existe.
    pub async fn recent_for_name(
        &self,
        customer_name: &str,
        limit: i64,
    ) -> Result<Vec<RecentPurchase>, AppError> {
        let result = sqlx::query_as::<_, RecentPurchase>(
            r#"
            SELECT id, total, created_at
            FROM sales
            WHERE customer_name = $1 AND status = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(customer_name)
        .bind(SALE_STATUS_COMPLETED)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(purchases) => Ok(purchases),
            Err(e) if is_undefined_table(&e) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_undefined_table(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01"))
}
