// src/models/sales.rs
//
// Projeções da tabela 'sales', que pertence ao módulo de vendas.
// O vínculo é pelo NOME do cliente (não pelo id) — herdado do modelo de
// dados original; ver DESIGN.md.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Só vendas neste status entram nas estatísticas.
pub const SALE_STATUS_COMPLETED: &str = "COMPLETED";

/// Agregado que o rollup grava de volta no cliente.
#[derive(Debug, Clone, FromRow)]
pub struct SalesStats {
    pub visit_count: i64,
    pub total_spent: Decimal,
    pub last_purchase_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RecentPurchase {
    pub id: Uuid,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}
