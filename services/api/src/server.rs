use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use shelter_intake::config::AppConfig;
use shelter_intake::telemetry;
use shelter_intake::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = build_services(&config)?;
    if config.bootstrap.admin.is_none() {
        warn!("no admin account configured; set APP_ADMIN_EMAIL and APP_ADMIN_PASSWORD");
    }
    info!(shelters = services.shelters.len(), "shelter directory seeded");

    let app = with_intake_routes(services.api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "shelter intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
