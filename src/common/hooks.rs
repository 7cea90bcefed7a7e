// src/common/hooks.rs
//
// Registro de pontos de extensão do módulo: um mapa de nome de evento para
// uma lista ordenada de handlers, invocados de forma síncrona (em linha com
// a operação que os dispara).
//
// Dois tipos de hook:
// - "action": observa o evento; pode vetar a operação retornando HookVeto.
// - "filter": recebe um valor, transforma e devolve.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

// Veto de um action hook. A mensagem é exibida para o usuário,
// então deve ser legível.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookVeto(pub String);

#[async_trait]
pub trait ActionHook: Send + Sync {
    async fn call(&self, payload: &Value) -> Result<(), HookVeto>;
}

#[async_trait]
pub trait FilterHook: Send + Sync {
    async fn apply(&self, value: Value, payload: &Value) -> Value;
}

#[derive(Default)]
pub struct HookRegistry {
    actions: RwLock<HashMap<String, Vec<Arc<dyn ActionHook>>>>,
    filters: RwLock<HashMap<String, Vec<Arc<dyn FilterHook>>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&self, name: &str, hook: Arc<dyn ActionHook>) {
        let mut actions = self.actions.write().expect("hook registry poisoned");
        actions.entry(name.to_string()).or_default().push(hook);
    }

    pub fn add_filter(&self, name: &str, hook: Arc<dyn FilterHook>) {
        let mut filters = self.filters.write().expect("hook registry poisoned");
        filters.entry(name.to_string()).or_default().push(hook);
    }

    /// Dispara os action hooks na ordem de registro. O primeiro veto
    /// interrompe a cadeia e é propagado para o chamador.
    pub async fn do_action(&self, name: &str, payload: &Value) -> Result<(), HookVeto> {
        // Clona os Arcs fora do lock: não podemos segurar o guard num await.
        let hooks: Vec<Arc<dyn ActionHook>> = {
            let actions = self.actions.read().expect("hook registry poisoned");
            actions.get(name).cloned().unwrap_or_default()
        };

        for hook in hooks {
            hook.call(payload).await?;
        }
        Ok(())
    }

    /// Variante "apenas notificação": vetos não fazem sentido aqui,
    /// então são apenas logados e descartados.
    pub async fn emit(&self, name: &str, payload: &Value) {
        if let Err(veto) = self.do_action(name, payload).await {
            tracing::warn!("Veto ignorado em notificação '{}': {}", name, veto);
        }
    }

    /// Passa o valor por todos os filter hooks registrados, na ordem.
    /// Sem hooks registrados, o valor volta intacto.
    pub async fn apply_filters(&self, name: &str, mut value: Value, payload: &Value) -> Value {
        let hooks: Vec<Arc<dyn FilterHook>> = {
            let filters = self.filters.read().expect("hook registry poisoned");
            filters.get(name).cloned().unwrap_or_default()
        };

        for hook in hooks {
            value = hook.apply(value, payload).await;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHook {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ActionHook for CountingHook {
        async fn call(&self, _payload: &Value) -> Result<(), HookVeto> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct VetoHook;

    #[async_trait]
    impl ActionHook for VetoHook {
        async fn call(&self, _payload: &Value) -> Result<(), HookVeto> {
            Err(HookVeto("operação bloqueada".to_string()))
        }
    }

    struct AppendHook {
        suffix: &'static str,
    }

    #[async_trait]
    impl FilterHook for AppendHook {
        async fn apply(&self, value: Value, _payload: &Value) -> Value {
            let mut s = value.as_str().unwrap_or_default().to_string();
            s.push_str(self.suffix);
            Value::String(s)
        }
    }

    #[tokio::test]
    async fn do_action_runs_handlers_in_order_and_stops_on_veto() {
        let registry = HookRegistry::new();
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));

        registry.add_action("save", Arc::new(CountingHook { calls: before.clone() }));
        registry.add_action("save", Arc::new(VetoHook));
        registry.add_action("save", Arc::new(CountingHook { calls: after.clone() }));

        let result = registry.do_action("save", &json!({})).await;

        assert!(result.is_err());
        assert_eq!(before.load(Ordering::SeqCst), 1);
        // O handler depois do veto nunca roda.
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn do_action_on_unknown_event_is_a_noop() {
        let registry = HookRegistry::new();
        assert!(registry.do_action("nada_registrado", &json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn emit_swallows_vetoes() {
        let registry = HookRegistry::new();
        registry.add_action("customer_created", Arc::new(VetoHook));
        // Não deve propagar o erro.
        registry.emit("customer_created", &json!({})).await;
    }

    #[tokio::test]
    async fn filters_apply_in_registration_order() {
        let registry = HookRegistry::new();
        registry.add_filter("fmt", Arc::new(AppendHook { suffix: "-a" }));
        registry.add_filter("fmt", Arc::new(AppendHook { suffix: "-b" }));

        let out = registry
            .apply_filters("fmt", json!("base"), &json!({}))
            .await;

        assert_eq!(out, json!("base-a-b"));
    }

    #[tokio::test]
    async fn filters_without_handlers_return_value_unchanged() {
        let registry = HookRegistry::new();
        let original = json!({"name": "Acme"});
        let out = registry
            .apply_filters("desconhecido", original.clone(), &json!({}))
            .await;
        assert_eq!(out, original);
    }
}
