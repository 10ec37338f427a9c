//! Axum Integration
//!
//! Exposes the registry through request extensions and a zero-argument
//! handle extractor.

use axum::http::{request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{extract::FromRequestParts, Json};
use serde::Serialize;

use crate::connector::Connector;
use crate::errors::ConnectError;
use crate::registry::DbRegistry;

/// Extractor yielding a live handle for the default database
///
/// Requires the `DbRegistry` to be installed on the router via
/// `Extension(registry)`. Handlers needing a non-default database take the
/// `Extension<DbRegistry<_>>` directly and call `named`.
pub struct Db<C: Connector>(pub C::Handle);

/// Rejection returned when no handle could be produced for a request
#[derive(Debug)]
pub enum DbRejection {
    /// No `DbRegistry` extension is installed on the router
    MissingRegistry,
    /// The slot failed to produce a live handle
    Acquire(ConnectError),
}

/// Error response body structure
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for DbRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::MissingRegistry => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "REGISTRY_NOT_INSTALLED",
                "Database registry is not available".to_string(),
            ),
            Self::Acquire(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "DATABASE_UNAVAILABLE",
                e.to_string(),
            ),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl<S, C> FromRequestParts<S> for Db<C>
where
    S: Send + Sync,
    C: Connector,
{
    type Rejection = DbRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let registry = parts
                .extensions
                .get::<DbRegistry<C>>()
                .ok_or(DbRejection::MissingRegistry)?
                .clone();

            let handle = registry.db().await.map_err(DbRejection::Acquire)?;
            Ok(Db(handle))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionSpec;
    use crate::connector::MockConnector;
    use crate::registry::Registrar;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::util::ServiceExt;

    async fn handle_value(Db(handle): Db<MockConnector>) -> String {
        handle.to_string()
    }

    #[tokio::test]
    async fn should_hand_the_default_handle_to_handlers() {
        let mut connector = MockConnector::new();
        connector.expect_connect().returning(|_| Ok(42));

        let registry = Registrar::new(connector)
            .database("db", ConnectionSpec::new("postgres://localhost/app"))
            .register()
            .await
            .expect("registration should succeed");

        let app = Router::new()
            .route("/", get(handle_value))
            .layer(Extension(registry));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"42");
    }

    #[tokio::test]
    async fn should_reject_with_500_when_registry_is_not_installed() {
        let app = Router::new().route("/", get(handle_value));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"]["code"], "REGISTRY_NOT_INSTALLED");
    }

    #[tokio::test]
    async fn should_reject_with_503_when_no_handle_can_be_produced() {
        let mut connector = MockConnector::new();
        connector
            .expect_connect()
            .returning(|_| Err(ConnectError::Unavailable("connection refused".to_string())));

        let registry = Registrar::new(connector)
            .database("db", ConnectionSpec::new("postgres://localhost/app"))
            .register()
            .await
            .expect("registration should succeed even when unreachable");

        let app = Router::new()
            .route("/", get(handle_value))
            .layer(Extension(registry));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["error"]["code"], "DATABASE_UNAVAILABLE");
    }
}
