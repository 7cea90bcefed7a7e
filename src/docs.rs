// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Customers ---
        handlers::customers::list_customers,
        handlers::customers::list_customers_json,
        handlers::customers::list_customers_rows,
        handlers::customers::create_customer,
        handlers::customers::get_customer,
        handlers::customers::edit_customer,
        handlers::customers::delete_customer,
        handlers::customers::update_customer_stats,
        handlers::customers::export_customers,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::save_settings,
        handlers::settings::toggle_setting,
        handlers::settings::select_setting,
        handlers::settings::reset_settings,
    ),
    components(
        schemas(
            models::customers::Customer,
            models::customers::CustomerListItem,
            models::customers::CustomerCounters,
            models::customers::StatusFilter,
            models::sales::RecentPurchase,
            models::settings::CustomersConfig,
            models::settings::SortOrder,
            models::settings::SaveSettingsPayload,
            models::settings::ToggleSettingPayload,
            models::settings::SelectSettingPayload,
            handlers::customers::CustomerPayload,
        )
    ),
    tags(
        (name = "Customers", description = "Gestão de clientes e estatísticas de compra"),
        (name = "Customers Settings", description = "Configuração singleton do módulo")
    )
)]
pub struct ApiDoc;
