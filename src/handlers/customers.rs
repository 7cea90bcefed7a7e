// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        extract::Json,
        pagination::{Page, PageParams},
    },
    config::AppState,
    handlers::{hx_trigger_header, toast},
    models::customers::{CustomerData, CustomerListItem, StatusFilter},
    services::customer_service::ListQuery,
};

// =============================================================================
//  PAYLOADS / PARÂMETROS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria da Silva")]
    pub name: String,

    #[schema(example = "maria@email.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,

    #[schema(example = "12345678Z")]
    pub tax_id: Option<String>,
    pub notes: Option<String>,

    // Só considerado na edição; ausente, mantém o estado gravado.
    // O create sempre começa ativo.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CustomerPayload {
    fn into_data(self) -> CustomerData {
        CustomerData {
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            tax_id: self.tax_id,
            notes: self.notes,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Busca por substring em nome, telefone, e-mail ou documento.
    pub search: Option<String>,
    /// active (default), inactive ou all.
    pub status: Option<StatusFilter>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    fn into_query(self) -> ListQuery {
        ListQuery {
            search: self.search,
            status: self.status.unwrap_or_default(),
            page: self.page,
            per_page: self.per_page,
        }
    }
}

// =============================================================================
//  LISTAGEM (três modos de entrega, um pipeline)
// =============================================================================

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(ListParams),
    responses(
        (status = 200, description = "Contadores + primeira página do listado")
    )
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let counters = app_state.customer_service.counters().await?;
    let page = app_state
        .customer_service
        .list_page(&params.into_query())
        .await?;

    Ok(Json(json!({
        "success": true,
        "total_customers": counters.total_customers,
        "inactive_customers": counters.inactive_customers,
        "new_this_month": counters.new_this_month,
        "customers": page.items,
        "has_next": page.has_next,
        "next_page": page.next_page,
        "total_count": page.total_count,
        "page_number": page.page_number,
    })))
}

// GET /api/customers/list
#[utoipa::path(
    get,
    path = "/api/customers/list",
    tag = "Customers",
    params(ListParams),
    responses(
        (status = 200, description = "Página de clientes em JSON")
    )
)]
pub async fn list_customers_json(
    State(app_state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .customer_service
        .list_page(&params.into_query())
        .await?;

    Ok(Json(json!({
        "success": true,
        "customers": page.items,
        "has_next": page.has_next,
        "next_page": page.next_page,
        "total_count": page.total_count,
        "page_number": page.page_number,
    })))
}

// GET /api/customers/rows
#[utoipa::path(
    get,
    path = "/api/customers/rows",
    tag = "Customers",
    params(ListParams),
    responses(
        (status = 200, description = "Fragmento HTML com as linhas de clientes", body = String, content_type = "text/html")
    )
)]
pub async fn list_customers_rows(
    State(app_state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.into_query();
    let page = app_state.customer_service.list_page(&query).await?;

    Ok(Html(render_rows(&app_state, &page, &query)?))
}

// =============================================================================
//  CRUD
// =============================================================================

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado"),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_service
        .create_customer(payload.into_data())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Cliente criado com sucesso",
            "customer_id": customer.id,
        })),
    ))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Detalhe do cliente + compras recentes"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.get_customer(id).await?;
    let recent_purchases = app_state
        .customer_service
        .recent_purchases(&customer)
        .await?;

    let mut customer_value = serde_json::to_value(&customer).map_err(anyhow::Error::from)?;
    customer_value["average_purchase"] =
        serde_json::to_value(customer.average_purchase()).map_err(anyhow::Error::from)?;

    Ok(Json(json!({
        "success": true,
        "customer": customer_value,
        "recent_purchases": recent_purchases,
    })))
}

// POST /api/customers/{id}/edit
#[utoipa::path(
    post,
    path = "/api/customers/{id}/edit",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado"),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn edit_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state
        .customer_service
        .update_customer(id, payload.into_data())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Cliente atualizado com sucesso",
    })))
}

// POST /api/customers/{id}/delete
//
// Soft delete. Com o header HX-Request a resposta é o fragmento de linhas
// já atualizado, com um toast fora de banda; sem ele, o envelope JSON.
#[utoipa::path(
    post,
    path = "/api/customers/{id}/delete",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente"), ListParams),
    responses(
        (status = 200, description = "Cliente desativado"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ListParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let is_htmx = headers.contains_key("HX-Request");

    if !is_htmx {
        app_state.customer_service.delete_customer(id).await?;
        return Ok(Json(json!({
            "success": true,
            "message": "Cliente desativado com sucesso",
        }))
        .into_response());
    }

    match app_state.customer_service.delete_customer(id).await {
        Ok(_) => {
            // Devolve o listado já sem o cliente (no filtro "active").
            let query = params.into_query();
            let page = app_state.customer_service.list_page(&query).await?;
            let html = render_rows(&app_state, &page, &query)?;
            let trigger = hx_trigger_header(&toast("Cliente desativado", "success"))?;
            Ok(([trigger], Html(html)).into_response())
        }
        Err(e) => {
            let trigger = hx_trigger_header(&toast(&e.to_string(), "danger"))?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, [trigger], ()).into_response())
        }
    }
}

// POST /api/customers/{id}/update-stats
#[utoipa::path(
    post,
    path = "/api/customers/{id}/update-stats",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Estatísticas recalculadas"),
        (status = 404, description = "Cliente não encontrado")
    )
)]
pub async fn update_customer_stats(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.update_stats(id).await?;

    Ok(Json(json!({
        "success": true,
        "total_spent": customer.total_spent,
        "visit_count": customer.visit_count,
        "average_purchase": customer.average_purchase(),
    })))
}

// =============================================================================
//  EXPORT
// =============================================================================

// GET /api/customers/export
#[utoipa::path(
    get,
    path = "/api/customers/export",
    tag = "Customers",
    responses(
        (status = 200, description = "CSV de clientes ativos", body = String, content_type = "text/csv")
    )
)]
pub async fn export_customers(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let (filename, body) = app_state.customer_service.export_csv().await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, body))
}

// --- interno ---

fn render_rows(
    app_state: &AppState,
    page: &Page<CustomerListItem>,
    query: &ListQuery,
) -> Result<String, AppError> {
    let params = PageParams::normalize(query.page, query.per_page);
    let template = app_state.templates.get_template("customer_rows.html")?;
    let html = template.render(json!({
        "customers": page.items,
        "has_next": page.has_next,
        "next_page": page.next_page,
        "total_count": page.total_count,
        // Filtros vigentes, repetidos na URL do sentinela de scroll.
        "status": query.status,
        "per_page": params.per_page,
        "search": query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    }))?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use crate::config::build_templates;

    fn render(ctx: serde_json::Value) -> String {
        let env = build_templates().unwrap();
        env.get_template("customer_rows.html")
            .unwrap()
            .render(ctx)
            .unwrap()
    }

    #[test]
    fn sentinel_url_carries_the_current_filters() {
        let html = render(serde_json::json!({
            "customers": [],
            "has_next": true,
            "next_page": 3,
            "total_count": 31,
            "status": "inactive",
            "per_page": 10,
            "search": "a b&c",
        }));

        assert!(html.contains("page=3"));
        assert!(html.contains("status=inactive"));
        assert!(html.contains("per_page=10"));
        // O termo sai percent-encoded dentro da URL do hx-get.
        assert!(html.contains("search=a%20b%26c"));
    }

    #[test]
    fn sentinel_url_omits_search_when_there_is_none() {
        let html = render(serde_json::json!({
            "customers": [],
            "has_next": true,
            "next_page": 2,
            "total_count": 40,
            "status": "active",
            "per_page": 25,
            "search": null,
        }));

        assert!(html.contains("page=2&status=active&per_page=25"));
        assert!(!html.contains("search="));
    }

    #[test]
    fn no_sentinel_row_on_the_last_page() {
        let html = render(serde_json::json!({
            "customers": [],
            "has_next": false,
            "next_page": null,
            "total_count": 5,
            "status": "active",
            "per_page": 25,
            "search": null,
        }));

        assert!(!html.contains("customer-row-sentinel"));
    }
}
