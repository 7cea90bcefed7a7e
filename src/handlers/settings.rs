// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    common::{error::AppError, extract::Json},
    config::AppState,
    handlers::{hx_trigger_header, toast},
    models::settings::{SaveSettingsPayload, SelectSettingPayload, SortOrder, ToggleSettingPayload},
};

// GET /api/customers/settings
#[utoipa::path(
    get,
    path = "/api/customers/settings",
    tag = "Customers Settings",
    responses(
        (status = 200, description = "Configuração do módulo + opções de ordenação")
    )
)]
pub async fn get_settings(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    // Criação preguiçosa: o primeiro acesso materializa a linha singleton.
    let config = app_state.settings_repo.get_or_create().await?;

    Ok(Json(json!({
        "success": true,
        "config": config,
        "sort_options": SortOrder::options(),
    })))
}

// POST /api/customers/settings/save
#[utoipa::path(
    post,
    path = "/api/customers/settings/save",
    tag = "Customers Settings",
    request_body = SaveSettingsPayload,
    responses(
        (status = 200, description = "Configurações salvas"),
        (status = 400, description = "Payload malformado")
    )
)]
pub async fn save_settings(
    State(app_state): State<AppState>,
    Json(payload): Json<SaveSettingsPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state.settings_repo.save(&payload).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Configurações salvas",
    })))
}

// POST /api/customers/settings/toggle
//
// Nome fora da allow-list é um no-op (nada muda, resposta igual).
#[utoipa::path(
    post,
    path = "/api/customers/settings/toggle",
    tag = "Customers Settings",
    request_body = ToggleSettingPayload,
    responses(
        (status = 204, description = "Ajuste aplicado (ou ignorado, se desconhecido)")
    )
)]
pub async fn toggle_setting(
    State(app_state): State<AppState>,
    Json(payload): Json<ToggleSettingPayload>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .settings_repo
        .toggle(&payload.name, payload.value)
        .await?;

    let trigger = hx_trigger_header(&toast("Ajuste atualizado", "success"))?;
    Ok((StatusCode::NO_CONTENT, [trigger], ()))
}

// POST /api/customers/settings/select
#[utoipa::path(
    post,
    path = "/api/customers/settings/select",
    tag = "Customers Settings",
    request_body = SelectSettingPayload,
    responses(
        (status = 204, description = "Ordenação default atualizada"),
        (status = 400, description = "Valor de ordenação desconhecido")
    )
)]
pub async fn select_setting(
    State(app_state): State<AppState>,
    Json(payload): Json<SelectSettingPayload>,
) -> Result<impl IntoResponse, AppError> {
    // Só default_sort é selecionável; outros nomes são ignorados.
    if payload.name == "default_sort" {
        app_state.settings_repo.select_sort(payload.value).await?;
    }

    let trigger = hx_trigger_header(&toast("Ajuste atualizado", "success"))?;
    Ok((StatusCode::NO_CONTENT, [trigger], ()))
}

// POST /api/customers/settings/reset
#[utoipa::path(
    post,
    path = "/api/customers/settings/reset",
    tag = "Customers Settings",
    responses(
        (status = 204, description = "Configurações restauradas para os defaults")
    )
)]
pub async fn reset_settings(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    app_state.settings_repo.reset().await?;

    // Além do toast, manda o shell recarregar a página inteira.
    let trigger = hx_trigger_header(&json!({
        "showToast": { "message": "Ajustes restaurados", "color": "warning" },
        "refreshPage": true,
    }))?;
    Ok((StatusCode::NO_CONTENT, [trigger], ()))
}
