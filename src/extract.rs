//! axum extractors whose rejections render as `AppError` JSON bodies.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// A malformed id cannot name any record, so it is reported as 404.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Named {
        #[allow(dead_code)]
        name: String,
    }

    #[derive(Deserialize)]
    struct Limit {
        #[allow(dead_code)]
        limit: u32,
    }

    fn router() -> Router {
        Router::new()
            .route("/json", post(|AppJson(_): AppJson<Named>| async { "ok" }))
            .route("/query", get(|AppQuery(_): AppQuery<Limit>| async { "ok" }))
            .route("/items/:id", get(|AppPath(_): AppPath<Uuid>| async { "ok" }))
    }

    async fn error_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn bad_json_field_is_422_with_error_body() {
        let req = Request::post("/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name": 5}"#))
            .unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(error_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_is_400_with_error_body() {
        let req = Request::post("/json")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{"))
            .unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected_as_json() {
        let req = Request::post("/json").body(Body::from(r#"{"name":"x"}"#)).unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn bad_query_is_400_with_error_body() {
        let req = Request::get("/query?limit=abc").body(Body::empty()).unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_id_is_404() {
        let req = Request::get("/items/not-a-uuid").body(Body::empty()).unwrap();
        let resp = router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_body(resp).await["error"], "Record not found");
    }
}
