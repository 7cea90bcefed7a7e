// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::hooks::HookRegistry,
    db::{CustomerRepository, SalesRepository, SettingsRepository},
    services::customer_service::SaleCompletedListener,
    services::CustomerService,
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub customer_service: CustomerService,
    pub settings_repo: SettingsRepository,
    pub hooks: Arc<HookRegistry>,
    pub templates: minijinja::Environment<'static>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let hooks = Arc::new(HookRegistry::new());

        let customer_repo = CustomerRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let customer_service = CustomerService::new(
            customer_repo,
            sales_repo,
            settings_repo.clone(),
            hooks.clone(),
        );

        // O módulo de vendas (quando instalado) emite sale_completed;
        // aqui ligamos a notificação ao rollup de estatísticas.
        hooks.add_action(
            "sale_completed",
            Arc::new(SaleCompletedListener::new(customer_service.clone())),
        );

        let templates = build_templates()?;

        Ok(Self {
            db_pool,
            customer_service,
            settings_repo,
            hooks,
            templates,
        })
    }
}

pub(crate) fn build_templates() -> Result<minijinja::Environment<'static>, minijinja::Error> {
    let mut env = minijinja::Environment::new();
    env.add_template(
        "customer_rows.html",
        include_str!("templates/customer_rows.html"),
    )?;
    Ok(env)
}
