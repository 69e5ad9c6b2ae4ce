use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use shelter_intake::api_router;
use shelter_intake::intake::{IntakeNotifier, IntakeRepository};
use shelter_intake::IntakeApi;

pub(crate) const API_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) fn with_intake_routes<R, N>(api: IntakeApi<R, N>) -> Router
where
    R: IntakeRepository + 'static,
    N: IntakeNotifier + 'static,
{
    api_router(api)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/version", get(version_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn version_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "project": "Shelter Intake", "api_version": API_VERSION }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_services, Services};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use shelter_intake::auth::AuthService;
    use shelter_intake::config::{
        AppConfig, AppEnvironment, AuthConfig, BootstrapConfig, Credentials, PagingConfig,
        ServerConfig, TelemetryConfig,
    };
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "warn".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "routes-secret".to_string(),
                token_ttl_minutes: 10,
            },
            paging: PagingConfig::default(),
            bootstrap: BootstrapConfig {
                admin: None,
                staff: Some(Credentials {
                    email: "staff@example.org".to_string(),
                    password: "pw".to_string(),
                }),
            },
        }
    }

    fn app(ready: bool) -> (Router, Services) {
        let services = build_services(&config()).expect("services");
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_intake_routes(services.api.clone()).layer(Extension(state));
        (router, services)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn health_and_version_are_public() {
        let (router, _) = app(true);

        let health = router.clone().oneshot(get("/health")).await.expect("health");
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(json_body(health).await, json!({ "status": "ok" }));

        let version = router.oneshot(get("/version")).await.expect("version");
        let body = json_body(version).await;
        assert_eq!(body["project"], "Shelter Intake");
        assert_eq!(body["api_version"], API_VERSION);
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        let (router, _) = app(false);
        let response = router.oneshot(get("/ready")).await.expect("ready");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let (router, _) = app(true);
        let response = router.oneshot(get("/ready")).await.expect("ready");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_shelters_are_listed_for_bootstrap_staff() {
        let (router, services) = app(true);
        let token = services
            .auth
            .login("staff@example.org", "pw")
            .expect("login")
            .access_token;

        let response = router
            .oneshot(
                Request::get("/shelters")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("shelters");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(services.shelters.len()));
    }

    #[tokio::test]
    async fn intake_search_is_mounted_behind_the_guard() {
        let (router, _) = app(true);
        let response = router
            .oneshot(get("/intake/search"))
            .await
            .expect("search");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
