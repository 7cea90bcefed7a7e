// src/db/customer_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::customers::{Customer, CustomerCounters, CustomerData, StatusFilter},
};

// O repositório de clientes, responsável por todas as interações com a
// tabela 'customers'.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria um cliente. As estatísticas começam zeradas (defaults do banco).
    pub async fn create(&self, data: &CustomerData) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, address, tax_id, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.tax_id)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Clientes com exatamente este nome (o ledger de vendas usa o nome
    /// como chave, então o listener de sale_completed busca assim).
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE name = $1 ORDER BY created_at DESC",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Reescrita completa dos campos mutáveis (sem patch parcial).
    /// O flag is_active chega já resolvido pelo serviço.
    pub async fn update(
        &self,
        id: Uuid,
        data: &CustomerData,
        is_active: bool,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $1, email = $2, phone = $3, address = $4,
                tax_id = $5, notes = $6, is_active = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.tax_id)
        .bind(&data.notes)
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Soft delete: o registro permanece no banco, só sai do filtro "active".
    pub async fn soft_delete(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            "UPDATE customers SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Persiste os três campos derivados calculados pelo rollup.
    pub async fn update_stats(
        &self,
        id: Uuid,
        total_spent: Decimal,
        visit_count: i32,
        last_purchase_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET total_spent = $1, visit_count = $2, last_purchase_at = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(total_spent)
        .bind(visit_count)
        .bind(last_purchase_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Página do listado: filtro de status + busca + ordenação + fatia,
    /// junto com o total de registros que casam com o filtro.
    /// Todos os modos de entrega passam por aqui.
    pub async fn list_page(
        &self,
        status: StatusFilter,
        search: Option<&str>,
        params: &PageParams,
    ) -> Result<(Vec<Customer>, i64), AppError> {
        // Transação para que fatia e contagem vejam o mesmo snapshot.
        let mut tx = self.pool.begin().await?;

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM customers");
        push_filters(&mut count_query, status, search);
        let total_count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        let mut select_query = QueryBuilder::<Postgres>::new("SELECT * FROM customers");
        push_filters(&mut select_query, status, search);
        select_query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        select_query.push_bind(params.limit());
        select_query.push(" OFFSET ");
        select_query.push_bind(params.offset());

        let customers = select_query
            .build_query_as::<Customer>()
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((customers, total_count))
    }

    /// Todos os clientes ativos em ordem alfabética (export CSV).
    pub async fn list_active_by_name(&self) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE is_active = TRUE ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Contadores da página de listagem.
    pub async fn counters(&self) -> Result<CustomerCounters, AppError> {
        let mut tx = self.pool.begin().await?;

        let total_customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = TRUE")
                .fetch_one(&mut *tx)
                .await?;

        let inactive_customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE is_active = FALSE")
                .fetch_one(&mut *tx)
                .await?;

        let new_this_month: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customers WHERE created_at >= date_trunc('month', NOW())",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CustomerCounters {
            total_customers,
            inactive_customers,
            new_this_month,
        })
    }
}

// Cláusulas WHERE compartilhadas entre a contagem e a seleção.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, status: StatusFilter, search: Option<&str>) {
    query.push(" WHERE TRUE");

    match status {
        StatusFilter::Active => {
            query.push(" AND is_active = TRUE");
        }
        StatusFilter::Inactive => {
            query.push(" AND is_active = FALSE");
        }
        StatusFilter::All => {}
    }

    // Busca: substring case-insensitive em qualquer um dos quatro campos.
    // Metacaracteres de LIKE são escapados para que o termo seja tratado
    // literalmente ("100%" não pode casar com tudo).
    if let Some(term) = search {
        let pattern = format!("%{}%", escape_like(term));
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR phone ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR email ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR tax_id ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

// Escapa %, _ e \ para que o termo buscado seja literal dentro do ILIKE
// (o escape default do Postgres é a barra invertida).
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(status: StatusFilter, search: Option<&str>) -> String {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM customers");
        push_filters(&mut query, status, search);
        query.into_sql()
    }

    #[test]
    fn active_filter_excludes_soft_deleted_rows() {
        let sql = sql_for(StatusFilter::Active, None);
        assert!(sql.contains("is_active = TRUE"));
        assert!(!sql.contains("is_active = FALSE"));
    }

    #[test]
    fn inactive_filter_surfaces_only_soft_deleted_rows() {
        let sql = sql_for(StatusFilter::Inactive, None);
        assert!(sql.contains("is_active = FALSE"));
        assert!(!sql.contains("is_active = TRUE"));
    }

    #[test]
    fn all_filter_has_no_status_clause() {
        let sql = sql_for(StatusFilter::All, None);
        assert!(!sql.contains("is_active"));
    }

    #[test]
    fn search_clause_covers_the_four_fields() {
        let sql = sql_for(StatusFilter::Active, Some("acme"));
        for field in ["name ILIKE", "phone ILIKE", "email ILIKE", "tax_id ILIKE"] {
            assert!(sql.contains(field), "faltou a cláusula: {field}");
        }
    }

    #[test]
    fn like_metacharacters_are_escaped_in_search_terms() {
        assert_eq!(escape_like("100%"), r"100\%");
        assert_eq!(escape_like("a_c"), r"a\_c");
        assert_eq!(escape_like(r"c:\temp"), r"c:\\temp");
        assert_eq!(escape_like("sem metacaractere"), "sem metacaractere");
    }
}
