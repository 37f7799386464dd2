use crate::cli::ServeArgs;
use crate::infra::{seed_demo_tenant, AppState, Services};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use site_safety::config::AppConfig;
use site_safety::error::AppError;
use site_safety::integrations::Integrations;
use site_safety::persistence::MemoryGateway;
use site_safety::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = Arc::new(MemoryGateway::new());
    if args.seed_demo {
        let demo = seed_demo_tenant(&gateway)?;
        info!(
            tenant_id = %demo.tenant,
            user_id = %demo.inspector,
            inspection_id = %demo.inspection,
            "demo tenant seeded"
        );
    }
    let integrations = Integrations::from_config(&config.integrations, &config.workflow)?;
    let services = Services::build(gateway, integrations, config.workflow.clone());

    let app = with_workflow_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "site safety service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
