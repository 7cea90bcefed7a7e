//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let customer_routes = Router::new()
        // Listagem (página cheia, JSON e fragmento compartilham o pipeline)
        .route(
            "/",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route("/list", get(handlers::customers::list_customers_json))
        .route("/rows", get(handlers::customers::list_customers_rows))
        // Export
        .route("/export", get(handlers::customers::export_customers))
        // Configurações do módulo
        .route("/settings", get(handlers::settings::get_settings))
        .route("/settings/save", post(handlers::settings::save_settings))
        .route("/settings/toggle", post(handlers::settings::toggle_setting))
        .route("/settings/select", post(handlers::settings::select_setting))
        .route("/settings/reset", post(handlers::settings::reset_settings))
        // Detalhe, edição, soft delete, rollup
        .route("/{id}", get(handlers::customers::get_customer))
        .route("/{id}/edit", post(handlers::customers::edit_customer))
        .route("/{id}/delete", post(handlers::customers::delete_customer))
        .route(
            "/{id}/update-stats",
            post(handlers::customers::update_customer_stats),
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/customers", customer_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
