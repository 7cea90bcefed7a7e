// src/common/extract.rs
//
// Json da API: igual ao axum::Json, mas a rejeição de corpo malformado
// vira o envelope padrão { success: false, error } com HTTP 400, em vez
// da resposta texto-plano default do axum.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::common::error::AppError;

#[derive(Debug)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))?;

        Ok(Self(value))
    }
}

// Na saída o comportamento é o do axum::Json de sempre.
impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{header, Request, StatusCode},
        response::IntoResponse,
    };
    use serde::Deserialize;

    use super::Json;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_body_yields_envelope_with_400() {
        let rejection = Json::<Payload>::from_request(json_request("{ nem json"), &())
            .await
            .expect_err("corpo malformado deve ser rejeitado");

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], serde_json::json!(false));
        assert!(value["error"].is_string());
    }

    #[tokio::test]
    async fn wrong_shape_yields_envelope_with_400() {
        // Sintaxe válida, shape errado (name precisa ser string).
        let rejection = Json::<Payload>::from_request(json_request(r#"{"name": 42}"#), &())
            .await
            .expect_err("shape errado deve ser rejeitado");

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn well_formed_body_passes_through() {
        let Json(payload) = Json::<Payload>::from_request(json_request(r#"{"name": "Acme"}"#), &())
            .await
            .expect("corpo válido deve passar");
        assert_eq!(payload.name, "Acme");
    }
}
