// src/db/settings_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::settings::{
        boolean_setting_column, CustomersConfig, SaveSettingsPayload, SortOrder, CONFIG_ROW_ID,
    },
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get-or-create do singleton. Dois primeiros acessos concorrentes
    /// convergem para a mesma linha: o INSERT ... ON CONFLICT DO NOTHING
    /// serializa a criação preguiçosa na constraint de id.
    pub async fn get_or_create(&self) -> Result<CustomersConfig, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO customers_config (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(CONFIG_ROW_ID)
            .execute(&mut *tx)
            .await?;

        let config =
            sqlx::query_as::<_, CustomersConfig>("SELECT * FROM customers_config WHERE id = $1")
                .bind(CONFIG_ROW_ID)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(config)
    }

    /// Salva todos os campos de uma vez (UPSERT).
    pub async fn save(&self, input: &SaveSettingsPayload) -> Result<CustomersConfig, AppError> {
        let config = sqlx::query_as::<_, CustomersConfig>(
            r#"
            INSERT INTO customers_config (
                id, require_phone, require_email, require_tax_id,
                show_inactive, default_sort, include_stats_in_export
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                require_phone = EXCLUDED.require_phone,
                require_email = EXCLUDED.require_email,
                require_tax_id = EXCLUDED.require_tax_id,
                show_inactive = EXCLUDED.show_inactive,
                default_sort = EXCLUDED.default_sort,
                include_stats_in_export = EXCLUDED.include_stats_in_export,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(CONFIG_ROW_ID)
        .bind(input.require_phone)
        .bind(input.require_email)
        .bind(input.require_tax_id)
        .bind(input.show_inactive)
        .bind(input.default_sort.as_str())
        .bind(input.include_stats_in_export)
        .fetch_one(&self.pool)
        .await?;

        Ok(config)
    }

    /// Liga/desliga um ajuste booleano pelo nome. Nomes fora da allow-list
    /// são um no-op: devolvemos a configuração atual sem tocar em nada.
    pub async fn toggle(&self, name: &str, value: bool) -> Result<CustomersConfig, AppError> {
        let Some(column) = boolean_setting_column(name) else {
            return self.get_or_create().await;
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO customers_config (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(CONFIG_ROW_ID)
            .execute(&mut *tx)
            .await?;

        // `column` vem da allow-list estática, nunca do usuário.
        let sql = format!(
            "UPDATE customers_config SET {column} = $1, updated_at = NOW() WHERE id = $2 RETURNING *"
        );
        let config = sqlx::query_as::<_, CustomersConfig>(&sql)
            .bind(value)
            .bind(CONFIG_ROW_ID)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(config)
    }

    pub async fn select_sort(&self, sort: SortOrder) -> Result<CustomersConfig, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO customers_config (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(CONFIG_ROW_ID)
            .execute(&mut *tx)
            .await?;

        let config = sqlx::query_as::<_, CustomersConfig>(
            "UPDATE customers_config SET default_sort = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(sort.as_str())
        .bind(CONFIG_ROW_ID)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(config)
    }

    /// Restaura todos os campos para os defaults documentados,
    /// numa única escrita.
    pub async fn reset(&self) -> Result<CustomersConfig, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO customers_config (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(CONFIG_ROW_ID)
            .execute(&mut *tx)
            .await?;

        let config = sqlx::query_as::<_, CustomersConfig>(
            r#"
            UPDATE customers_config
            SET require_phone = FALSE,
                require_email = FALSE,
                require_tax_id = FALSE,
                show_inactive = FALSE,
                default_sort = 'name',
                include_stats_in_export = TRUE,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(CONFIG_ROW_ID)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(config)
    }
}
