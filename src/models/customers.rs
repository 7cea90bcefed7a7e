// src/models/customers.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,

    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,

    // Campos calculados pelo rollup de estatísticas.
    // Nunca editados diretamente pelo usuário.
    pub total_spent: Decimal,
    pub visit_count: i32,
    pub last_purchase_at: Option<DateTime<Utc>>,

    // Soft delete
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Valor médio por compra, com 2 casas decimais.
    /// Com visit_count zero o resultado é 0.00 (nunca divide por zero).
    pub fn average_purchase(&self) -> Decimal {
        if self.visit_count > 0 {
            (self.total_spent / Decimal::from(self.visit_count)).round_dp(2)
        } else {
            Decimal::ZERO
        }
    }
}

/// Forma normalizada dos dados de um cliente vindos do formulário:
/// strings aparadas, vazias viram None. É também o payload que circula
/// pelos hooks filter_customer_data / before_customer_save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerData {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
    // None = o payload não tocou no flag; a edição mantém o valor atual.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl CustomerData {
    /// Resolve o flag de ativo na edição: ausente do payload mantém o
    /// estado gravado (nunca reativa um cliente desativado por engano).
    pub fn resolved_is_active(&self, current: bool) -> bool {
        self.is_active.unwrap_or(current)
    }
}

// Filtro de status do listado. O default é só ativos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
    All,
}

/// Projeção de um cliente para o listado (JSON e fragmento HTML usam a
/// mesma struct — os três modos de entrega saem idênticos).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerListItem {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub tax_id: String,
    pub total_spent: Decimal,
    pub visit_count: i32,
    pub average_purchase: Decimal,
    pub last_purchase: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<Customer> for CustomerListItem {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            phone: customer.phone.clone().unwrap_or_default(),
            email: customer.email.clone().unwrap_or_default(),
            tax_id: customer.tax_id.clone().unwrap_or_default(),
            total_spent: customer.total_spent,
            visit_count: customer.visit_count,
            average_purchase: customer.average_purchase(),
            last_purchase: customer
                .last_purchase_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
            is_active: customer.is_active,
            created_at: customer.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

// Contadores mostrados no topo da página de listagem.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerCounters {
    pub total_customers: i64,
    pub inactive_customers: i64,
    pub new_this_month: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn customer(total_spent: Decimal, visit_count: i32) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            email: None,
            phone: None,
            address: None,
            tax_id: None,
            notes: None,
            total_spent,
            visit_count,
            last_purchase_at: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn average_purchase_is_zero_without_visits() {
        let c = customer(dec!(0.00), 0);
        assert_eq!(c.average_purchase(), Decimal::ZERO);

        // Mesmo com total_spent residual, sem visitas não há média.
        let c = customer(dec!(99.90), 0);
        assert_eq!(c.average_purchase(), Decimal::ZERO);
    }

    #[test]
    fn average_purchase_rounds_to_two_decimals() {
        let c = customer(dec!(10.00), 3);
        assert_eq!(c.average_purchase(), dec!(3.33));

        let c = customer(dec!(50.00), 2);
        assert_eq!(c.average_purchase(), dec!(25.00));
    }

    #[test]
    fn list_item_formats_dates_and_blanks_missing_fields() {
        let mut c = customer(dec!(20.00), 2);
        c.email = Some("a@b.com".to_string());
        c.last_purchase_at = Some("2026-03-05T14:30:00Z".parse().unwrap());
        c.created_at = "2026-01-02T10:00:00Z".parse().unwrap();

        let item = CustomerListItem::from(c);
        assert_eq!(item.email, "a@b.com");
        assert_eq!(item.phone, "");
        assert_eq!(item.last_purchase.as_deref(), Some("2026-03-05 14:30"));
        assert_eq!(item.created_at, "2026-01-02");
        assert_eq!(item.average_purchase, dec!(10.00));
    }

    #[test]
    fn absent_is_active_keeps_the_stored_state_on_edit() {
        let data: CustomerData =
            serde_json::from_value(serde_json::json!({ "name": "Acme" })).unwrap();
        assert_eq!(data.is_active, None);

        // Editar um cliente desativado sem mexer no flag não o reativa.
        assert!(!data.resolved_is_active(false));
        assert!(data.resolved_is_active(true));
    }

    #[test]
    fn explicit_is_active_overrides_the_stored_state() {
        let data: CustomerData = serde_json::from_value(serde_json::json!({
            "name": "Acme",
            "is_active": false,
        }))
        .unwrap();
        assert_eq!(data.is_active, Some(false));
        assert!(!data.resolved_is_active(true));
    }
}
