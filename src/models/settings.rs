// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;

// A linha singleton usa sempre este id (CHECK (id = 1) no banco).
pub const CONFIG_ROW_ID: i32 = 1;

// Ordenação default do listado. Os valores no banco e na API seguem a
// convenção "-campo" para ordem descendente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "-created_at")]
    NewestFirst,
    #[serde(rename = "-total_spent")]
    HighestSpending,
    #[serde(rename = "-visit_count")]
    MostVisits,
}

#[derive(Debug, Error)]
#[error("ordenação desconhecida: {0}")]
pub struct InvalidSortOrder(String);

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Name => "name",
            SortOrder::NewestFirst => "-created_at",
            SortOrder::HighestSpending => "-total_spent",
            SortOrder::MostVisits => "-visit_count",
        }
    }

    /// Opções para o select da página de configurações.
    pub fn options() -> Value {
        json!([
            { "value": "name", "label": "Nome (A-Z)" },
            { "value": "-created_at", "label": "Mais recentes" },
            { "value": "-total_spent", "label": "Maior gasto" },
            { "value": "-visit_count", "label": "Mais visitas" },
        ])
    }
}

impl TryFrom<String> for SortOrder {
    type Error = InvalidSortOrder;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "name" => Ok(SortOrder::Name),
            "-created_at" => Ok(SortOrder::NewestFirst),
            "-total_spent" => Ok(SortOrder::HighestSpending),
            "-visit_count" => Ok(SortOrder::MostVisits),
            _ => Err(InvalidSortOrder(value)),
        }
    }
}

/// Configuração singleton do módulo (exatamente uma linha, id = 1).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CustomersConfig {
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub id: i32,

    // Obriga os campos correspondentes no create/edit de clientes.
    pub require_phone: bool,
    pub require_email: bool,
    pub require_tax_id: bool,

    // Exibição
    pub show_inactive: bool,
    #[sqlx(try_from = "String")]
    pub default_sort: SortOrder,

    // Export
    pub include_stats_in_export: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for CustomersConfig {
    fn default() -> Self {
        Self {
            id: CONFIG_ROW_ID,
            require_phone: false,
            require_email: false,
            require_tax_id: false,
            show_inactive: false,
            default_sort: SortOrder::Name,
            include_stats_in_export: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

// Allow-list dos toggles booleanos: nome do ajuste -> coluna no banco.
// Nomes fora desta tabela são ignorados (no-op), nunca erro.
pub fn boolean_setting_column(name: &str) -> Option<&'static str> {
    match name {
        "require_phone" => Some("require_phone"),
        "require_email" => Some("require_email"),
        "require_tax_id" => Some("require_tax_id"),
        "show_inactive" => Some("show_inactive"),
        "include_stats_in_export" => Some("include_stats_in_export"),
        _ => None,
    }
}

// --- Payloads ---

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveSettingsPayload {
    #[serde(default)]
    pub require_phone: bool,
    #[serde(default)]
    pub require_email: bool,
    #[serde(default)]
    pub require_tax_id: bool,
    #[serde(default)]
    pub show_inactive: bool,
    #[serde(default)]
    pub default_sort: SortOrder,
    #[serde(default = "default_true")]
    pub include_stats_in_export: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleSettingPayload {
    pub name: String,
    #[serde(default)]
    pub value: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectSettingPayload {
    pub name: String,
    pub value: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_round_trips_through_strings() {
        for sort in [
            SortOrder::Name,
            SortOrder::NewestFirst,
            SortOrder::HighestSpending,
            SortOrder::MostVisits,
        ] {
            let parsed = SortOrder::try_from(sort.as_str().to_string()).unwrap();
            assert_eq!(parsed, sort);
        }
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        assert!(SortOrder::try_from("-updated_at".to_string()).is_err());
        assert!(SortOrder::try_from("".to_string()).is_err());
    }

    #[test]
    fn toggle_allow_list_covers_exactly_the_boolean_settings() {
        for name in [
            "require_phone",
            "require_email",
            "require_tax_id",
            "show_inactive",
            "include_stats_in_export",
        ] {
            assert!(boolean_setting_column(name).is_some());
        }

        // default_sort não é booleano; nomes inventados são ignorados.
        assert!(boolean_setting_column("default_sort").is_none());
        assert!(boolean_setting_column("is_admin").is_none());
        assert!(boolean_setting_column("").is_none());
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = CustomersConfig::default();
        assert!(!config.require_phone);
        assert!(!config.require_email);
        assert!(!config.require_tax_id);
        assert!(!config.show_inactive);
        assert_eq!(config.default_sort, SortOrder::Name);
        assert!(config.include_stats_in_export);
    }
}
