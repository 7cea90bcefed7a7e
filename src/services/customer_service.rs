// src/services/customer_service.rs
//
// Regras de negócio do módulo de clientes: validação condicionada à
// configuração, orquestração dos hooks, pipeline de listagem compartilhado
// pelos três modos de entrega, rollup de estatísticas e export CSV.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    common::{
        csv,
        error::AppError,
        hooks::{ActionHook, HookRegistry, HookVeto},
        pagination::{Page, PageParams},
    },
    db::{CustomerRepository, SalesRepository, SettingsRepository},
    models::{
        customers::{Customer, CustomerCounters, CustomerData, CustomerListItem, StatusFilter},
        sales::RecentPurchase,
        settings::CustomersConfig,
    },
};

// Quantas compras recentes aparecem no detalhe do cliente.
const RECENT_PURCHASES_LIMIT: i64 = 10;

/// Parâmetros da listagem, já desacoplados da query string.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    sales: SalesRepository,
    settings: SettingsRepository,
    hooks: Arc<HookRegistry>,
}

impl CustomerService {
    pub fn new(
        repo: CustomerRepository,
        sales: SalesRepository,
        settings: SettingsRepository,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        Self {
            repo,
            sales,
            settings,
            hooks,
        }
    }

    // =========================================================================
    //  CRUD
    // =========================================================================

    pub async fn create_customer(&self, input: CustomerData) -> Result<Customer, AppError> {
        // A configuração é lida a cada requisição, nunca cacheada.
        let config = self.settings.get_or_create().await?;

        let mut data = normalized(input);
        data.is_active = Some(true);

        let data = self.apply_data_filters(data, None).await?;
        validate(&data, &config)?;

        // before_customer_save pode vetar; o veto aborta sem gravar nada.
        let ctx = json!({ "customer": Value::Null, "data": data });
        self.hooks
            .do_action("customers.before_customer_save", &ctx)
            .await
            .map_err(|veto| AppError::Validation(veto.0))?;

        let customer = self.repo.create(&data).await?;

        self.hooks
            .emit(
                "customers.after_customer_save",
                &json!({ "customer": customer, "created": true }),
            )
            .await;
        self.hooks
            .emit(
                "customer_created",
                &json!({ "customer_id": customer.id, "name": customer.name }),
            )
            .await;

        Ok(customer)
    }

    /// Edição é reescrita completa dos campos mutáveis. O flag is_active só
    /// muda quando vem no payload; ausente, o estado atual é mantido.
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: CustomerData,
    ) -> Result<Customer, AppError> {
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        let config = self.settings.get_or_create().await?;

        let data = normalized(input);
        let data = self.apply_data_filters(data, Some(&existing)).await?;
        validate(&data, &config)?;

        let ctx = json!({ "customer": existing, "data": data });
        self.hooks
            .do_action("customers.before_customer_save", &ctx)
            .await
            .map_err(|veto| AppError::Validation(veto.0))?;

        let is_active = data.resolved_is_active(existing.is_active);
        let customer = self
            .repo
            .update(id, &data, is_active)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        self.hooks
            .emit(
                "customers.after_customer_save",
                &json!({ "customer": customer, "created": false }),
            )
            .await;
        self.hooks
            .emit(
                "customer_updated",
                &json!({ "customer_id": customer.id, "name": customer.name }),
            )
            .await;

        Ok(customer)
    }

    /// Soft delete. Funciona mesmo com dados relacionados, porque a linha
    /// nunca sai do banco.
    pub async fn delete_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        let customer = self
            .repo
            .soft_delete(id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        self.hooks
            .emit(
                "customer_deleted",
                &json!({ "customer_id": customer.id, "name": customer.name }),
            )
            .await;

        Ok(customer)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    pub async fn recent_purchases(
        &self,
        customer: &Customer,
    ) -> Result<Vec<RecentPurchase>, AppError> {
        self.sales
            .recent_for_name(&customer.name, RECENT_PURCHASES_LIMIT)
            .await
    }

    // =========================================================================
    //  ROLLUP DE ESTATÍSTICAS
    // =========================================================================

    /// Recalcula visit_count / total_spent / last_purchase_at a partir do
    /// ledger de vendas e persiste os três campos. Com o ledger ausente é
    /// um no-op silencioso: devolve o cliente como está, sem escrita
    /// parcial. Idempotente sobre dados de venda inalterados.
    pub async fn update_stats(&self, id: Uuid) -> Result<Customer, AppError> {
        let customer = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::CustomerNotFound)?;

        self.rollup(customer).await
    }

    async fn rollup(&self, customer: Customer) -> Result<Customer, AppError> {
        let Some(stats) = self.sales.stats_for_name(&customer.name).await? else {
            return Ok(customer);
        };

        let visit_count = i32::try_from(stats.visit_count).unwrap_or(i32::MAX);
        // Sem vendas, MAX(created_at) vem nulo e o campo é limpo junto
        // com os contadores, numa única escrita.
        self.repo
            .update_stats(
                customer.id,
                stats.total_spent,
                visit_count,
                stats.last_purchase_at,
            )
            .await?
            .ok_or(AppError::CustomerNotFound)
    }

    /// Rollup para todos os clientes com este nome (o ledger usa o nome
    /// como chave; homônimos são agregados juntos).
    pub async fn refresh_stats_for_name(&self, name: &str) -> Result<(), AppError> {
        for customer in self.repo.find_by_name(name).await? {
            self.rollup(customer).await?;
        }
        Ok(())
    }

    // =========================================================================
    //  LISTAGEM (pipeline único para JSON, fragmento e página cheia)
    // =========================================================================

    pub async fn list_page(&self, query: &ListQuery) -> Result<Page<CustomerListItem>, AppError> {
        let params = PageParams::normalize(query.page, query.per_page);
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let (customers, total_count) = self.repo.list_page(query.status, search, &params).await?;
        let page = Page::build(customers, total_count, &params).map(CustomerListItem::from);

        // filter_customer_list: outros módulos podem anotar ou excluir itens.
        let items_value = serde_json::to_value(&page.items).map_err(anyhow::Error::from)?;
        let ctx = json!({ "search": search, "status": query.status });
        let filtered = self
            .hooks
            .apply_filters("customers.filter_customer_list", items_value, &ctx)
            .await;
        let items: Vec<CustomerListItem> = serde_json::from_value(filtered).map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!(
                "filter_customer_list produziu dados inválidos: {e}"
            ))
        })?;

        Ok(Page { items, ..page })
    }

    pub async fn counters(&self) -> Result<CustomerCounters, AppError> {
        self.repo.counters().await
    }

    // =========================================================================
    //  EXPORT CSV
    // =========================================================================

    /// Gera o documento CSV (ativos, ordem alfabética) e o nome do arquivo.
    pub async fn export_csv(&self) -> Result<(String, String), AppError> {
        let config = self.settings.get_or_create().await?;
        let customers = self.repo.list_active_by_name().await?;

        let body = csv_document(&customers, config.include_stats_in_export);
        let filename = format!("customers_{}.csv", Utc::now().format("%Y%m%d"));

        Ok((filename, body))
    }

    // --- internos ---

    async fn apply_data_filters(
        &self,
        data: CustomerData,
        existing: Option<&Customer>,
    ) -> Result<CustomerData, AppError> {
        let data_value = serde_json::to_value(&data).map_err(anyhow::Error::from)?;
        let ctx = json!({ "customer": existing });
        let filtered = self
            .hooks
            .apply_filters("customers.filter_customer_data", data_value, &ctx)
            .await;

        serde_json::from_value(filtered).map_err(|e| {
            AppError::InternalServerError(anyhow::anyhow!(
                "filter_customer_data produziu dados inválidos: {e}"
            ))
        })
    }
}

/// Apara as strings do formulário; campos opcionais vazios viram None.
fn normalized(mut data: CustomerData) -> CustomerData {
    fn clean(value: Option<String>) -> Option<String> {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    data.name = data.name.trim().to_string();
    data.email = clean(data.email);
    data.phone = clean(data.phone);
    data.address = clean(data.address);
    data.tax_id = clean(data.tax_id);
    data.notes = clean(data.notes);
    data
}

/// Validação do boundary: nome sempre obrigatório; e-mail/telefone/documento
/// conforme a configuração vigente. E-mail, quando presente, precisa ser
/// sintaticamente válido.
fn validate(data: &CustomerData, config: &CustomersConfig) -> Result<(), AppError> {
    if data.name.is_empty() {
        return Err(AppError::Validation("O nome é obrigatório".to_string()));
    }

    if let Some(email) = &data.email {
        if !email.validate_email() {
            return Err(AppError::Validation("E-mail inválido".to_string()));
        }
    }

    if config.require_email && data.email.is_none() {
        return Err(AppError::Validation("O e-mail é obrigatório".to_string()));
    }
    if config.require_phone && data.phone.is_none() {
        return Err(AppError::Validation("O telefone é obrigatório".to_string()));
    }
    if config.require_tax_id && data.tax_id.is_none() {
        return Err(AppError::Validation(
            "O documento fiscal é obrigatório".to_string(),
        ));
    }

    Ok(())
}

/// Documento CSV do export. Cabeçalho fixo; com include_stats desligado as
/// colunas de estatística saem em branco.
fn csv_document(customers: &[Customer], include_stats: bool) -> String {
    let mut out = String::new();
    csv::write_row(
        &mut out,
        &[
            "Name",
            "Email",
            "Phone",
            "Tax ID",
            "Total Spent",
            "Visit Count",
            "Created At",
        ],
    );

    for customer in customers {
        let total_spent = if include_stats {
            customer.total_spent.to_string()
        } else {
            String::new()
        };
        let visit_count = if include_stats {
            customer.visit_count.to_string()
        } else {
            String::new()
        };
        let created_at = customer.created_at.format("%Y-%m-%d").to_string();

        csv::write_row(
            &mut out,
            &[
                &customer.name,
                customer.email.as_deref().unwrap_or(""),
                customer.phone.as_deref().unwrap_or(""),
                customer.tax_id.as_deref().unwrap_or(""),
                &total_spent,
                &visit_count,
                &created_at,
            ],
        );
    }

    out
}

// =============================================================================
//  LISTENER DE sale_completed
// =============================================================================

/// Registrado no HookRegistry na inicialização: quando o módulo de vendas
/// emite sale_completed, o rollup roda para o cliente citado. Falhas são
/// logadas e nunca propagadas para quem emitiu a notificação.
pub struct SaleCompletedListener {
    service: CustomerService,
}

impl SaleCompletedListener {
    pub fn new(service: CustomerService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ActionHook for SaleCompletedListener {
    async fn call(&self, payload: &Value) -> Result<(), HookVeto> {
        let Some(name) = payload.get("customer_name").and_then(Value::as_str) else {
            tracing::warn!("sale_completed sem customer_name; ignorando");
            return Ok(());
        };

        if let Err(e) = self.service.refresh_stats_for_name(name).await {
            tracing::error!("Falha ao atualizar estatísticas de '{}': {:?}", name, e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn data(name: &str) -> CustomerData {
        CustomerData {
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            tax_id: None,
            notes: None,
            is_active: None,
        }
    }

    fn customer(name: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            tax_id: None,
            notes: None,
            total_spent: dec!(0.00),
            visit_count: 0,
            last_purchase_at: None,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn normalization_trims_and_drops_empty_optionals() {
        let mut input = data("  Acme  ");
        input.email = Some("   ".to_string());
        input.phone = Some(" 555-1234 ".to_string());

        let out = normalized(input);
        assert_eq!(out.name, "Acme");
        assert_eq!(out.email, None);
        assert_eq!(out.phone.as_deref(), Some("555-1234"));
    }

    #[test]
    fn empty_name_fails_validation() {
        let config = CustomersConfig::default();
        let result = validate(&normalized(data("   ")), &config);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn optional_fields_pass_when_not_required() {
        // Equivalente ao fim-a-fim: {name: "Acme", email: "", phone: ""}
        // com require_email=false e require_phone=false.
        let config = CustomersConfig::default();
        let mut input = data("Acme");
        input.email = Some(String::new());
        input.phone = Some(String::new());

        assert!(validate(&normalized(input), &config).is_ok());
    }

    #[test]
    fn required_fields_are_enforced_per_config() {
        let config = CustomersConfig {
            require_email: true,
            ..CustomersConfig::default()
        };
        let result = validate(&data("Acme"), &config);
        assert!(matches!(result, Err(AppError::Validation(m)) if m.contains("e-mail")));

        let config = CustomersConfig {
            require_phone: true,
            require_tax_id: true,
            ..CustomersConfig::default()
        };
        let mut input = data("Acme");
        input.phone = Some("555".to_string());
        input.tax_id = Some("B1234".to_string());
        assert!(validate(&input, &config).is_ok());
    }

    #[test]
    fn syntactically_invalid_email_is_rejected_even_when_optional() {
        let config = CustomersConfig::default();
        let mut input = data("Acme");
        input.email = Some("nao-e-email".to_string());
        assert!(validate(&input, &config).is_err());
    }

    #[test]
    fn csv_document_has_fixed_header_and_date_only_created_at() {
        let mut c = customer("Acme, SA");
        c.email = Some("acme@example.com".to_string());
        c.total_spent = dec!(125.50);
        c.visit_count = 3;

        let doc = csv_document(&[c], true);
        let mut lines = doc.lines();
        assert_eq!(
            lines.next(),
            Some("Name,Email,Phone,Tax ID,Total Spent,Visit Count,Created At")
        );
        assert_eq!(
            lines.next(),
            Some("\"Acme, SA\",acme@example.com,,,125.50,3,2026-02-10")
        );
    }

    #[test]
    fn csv_document_blanks_stats_when_disabled() {
        let mut c = customer("Acme");
        c.total_spent = dec!(99.00);
        c.visit_count = 7;

        let doc = csv_document(&[c], false);
        let row = doc.lines().nth(1).unwrap();
        assert_eq!(row, "Acme,,,,,,2026-02-10");
    }
}
