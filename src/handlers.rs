pub mod customers;
pub mod settings;

use axum::http::{HeaderName, HeaderValue};
use serde_json::{json, Value};

use crate::common::error::AppError;

// Eventos fora de banda para o shell do cliente (htmx), entregues no
// header HX-Trigger como JSON.

pub(crate) fn toast(message: &str, color: &str) -> Value {
    json!({ "showToast": { "message": message, "color": color } })
}

pub(crate) fn hx_trigger_header(events: &Value) -> Result<(HeaderName, HeaderValue), AppError> {
    let value = HeaderValue::from_str(&events.to_string()).map_err(anyhow::Error::from)?;
    Ok((HeaderName::from_static("hx-trigger"), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_payload_carries_message_and_color() {
        let value = toast("Cliente desativado", "success");
        assert_eq!(value["showToast"]["message"], "Cliente desativado");
        assert_eq!(value["showToast"]["color"], "success");
    }

    #[test]
    fn trigger_header_is_valid_even_with_accents() {
        let (name, _value) = hx_trigger_header(&toast("Operação concluída", "success")).unwrap();
        assert_eq!(name.as_str(), "hx-trigger");
    }
}
