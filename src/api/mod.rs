use crate::{
    api::handlers::{
        accounts::{doctors, patients},
        auth::{login, principal::require_admin},
        clinical::{appointments, costs, histories},
    },
    db,
};
use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
mod openapi;

pub use self::handlers::auth::{bootstrap_admin, AuthConfig};
pub use self::openapi::openapi;

/// Routes that require an admin token.
fn admin_routes() -> Router {
    Router::new()
        .route("/doctor-registration", post(doctors::register_doctor))
        .route("/doctors", get(doctors::list_doctors))
        .route(
            "/doctors/:pk",
            get(doctors::get_doctor)
                .put(doctors::update_doctor)
                .delete(doctors::delete_doctor),
        )
        .route("/doctor-approvals", get(doctors::list_pending_doctors))
        .route(
            "/doctor-approvals/:pk",
            get(doctors::get_pending_doctor)
                .put(doctors::approve_doctor)
                .delete(doctors::reject_doctor),
        )
        .route("/patient-registration", post(patients::register_patient))
        .route("/patients", get(patients::list_patients))
        .route(
            "/patients/:pk",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route("/patient-approvals", get(patients::list_pending_patients))
        .route(
            "/patient-approvals/:pk",
            get(patients::get_pending_patient)
                .put(patients::approve_patient)
                .delete(patients::reject_patient),
        )
        .route(
            "/patients/:pk/history",
            get(histories::list_histories).post(histories::create_history),
        )
        .route(
            "/patients/:pk/history/:hid",
            get(histories::get_history)
                .put(histories::update_history)
                .delete(histories::delete_history),
        )
        .route(
            "/patients/:pk/history/:hid/cost",
            get(costs::get_cost)
                .put(costs::put_cost)
                .delete(costs::delete_cost),
        )
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/appointments/:pk",
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            "/appointment-approvals",
            get(appointments::list_pending_appointments),
        )
        .route(
            "/appointment-approvals/:pk",
            get(appointments::get_pending_appointment)
                .put(appointments::approve_appointment)
                .delete(appointments::reject_appointment),
        )
        .route_layer(middleware::from_fn(require_admin))
}

/// Build the application router.
///
/// `login` and `logout` sit outside the admin gate; `logout` authenticates on
/// its own so any token holder can revoke their token.
#[must_use]
pub fn app(pool: PgPool, auth_config: AuthConfig) -> Router {
    let api = admin_routes()
        .route("/login", post(login::login))
        .route("/logout", post(login::logout));

    Router::new()
        .nest("/api/admin", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(Arc::new(auth_config)))
                .layer(Extension(pool.clone())),
        )
        .route(
            "/health",
            get(handlers::health).options(handlers::health),
        )
        .layer(Extension(pool))
}

/// Connect to the database and serve until `ctrl-c`.
///
/// # Errors
/// Returns an error if the database is unreachable or the port cannot be bound.
pub async fn new(port: u16, dsn: String, auth_config: AuthConfig) -> Result<()> {
    let pool = db::connect(&dsn).await?;

    let app = app(pool, auth_config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let method = request.method().as_str();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", method, path, request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Method, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    // Requests rejected before any query never open a connection.
    fn test_app() -> anyhow::Result<Router> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://hospital@localhost:5432/hospital")?;
        Ok(app(pool, AuthConfig::default()))
    }

    async fn json_body(response: axum::response::Response) -> anyhow::Result<Value> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() -> anyhow::Result<()> {
        for uri in [
            "/api/admin/doctors",
            "/api/admin/patients/1",
            "/api/admin/patients/1/history/2/cost",
            "/api/admin/appointment-approvals",
        ] {
            let response = test_app()?
                .oneshot(Request::builder().uri(uri).body(Body::empty())?)
                .await?;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert!(response.headers().contains_key("x-request-id"));
            let body = json_body(response).await?;
            assert_eq!(
                body["detail"],
                "Authentication credentials were not provided."
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn non_token_scheme_is_unauthorized() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/admin/doctors/7")
                    .header(header::AUTHORIZATION, "Basic YWRtaW46YWRtaW4=")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn request_id_is_propagated() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .uri("/api/admin/doctors")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-123")
        );
        Ok(())
    }

    #[tokio::test]
    async fn login_without_fields_lists_them() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/admin/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert_eq!(body["username"][0], "This field is required.");
        assert_eq!(body["password"][0], "This field is required.");
        Ok(())
    }

    #[tokio::test]
    async fn login_with_blank_password() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/admin/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username": "root", "password": ""}"#))?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert!(body.get("username").is_none());
        assert_eq!(body["password"][0], "This field may not be blank.");
        Ok(())
    }

    #[tokio::test]
    async fn login_with_wrong_field_type() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/admin/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username": 42, "password": "secret-pass"}"#))?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await?;
        assert!(body["non_field_errors"][0].is_string());
        assert!(body.get("username").is_none());
        assert!(body.get("password").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn logout_without_token_is_unauthorized() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/admin/logout")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn openapi_document_is_served() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await?;
        assert_eq!(body["info"]["title"], env!("CARGO_PKG_NAME"));
        assert!(body["paths"]["/api/admin/appointments"].is_object());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() -> anyhow::Result<()> {
        let response = test_app()?
            .oneshot(
                Request::builder()
                    .uri("/api/admin/nurses")
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
