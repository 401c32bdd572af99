use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApprovalsGateway};
use crate::routes::with_clearance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use nodues::config::AppConfig;
use nodues::error::AppError;
use nodues::session::{ActorIdentity, SessionContext};
use nodues::telemetry;
use nodues::workflows::clearance::ClearanceService;
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

    let session = Arc::new(SessionContext::with_timeout(
        ActorIdentity {
            name: args.actor.clone(),
            role: args.role.clone(),
        },
        config.session.timeout(),
    ));
    session.activate();
    session.subscribe(|state| info!(?state, "clearance session transitioned"));

    let gateway = Arc::new(InMemoryApprovalsGateway::seeded());
    let clearance_service = Arc::new(ClearanceService::new(gateway, session));

    let app = with_clearance_routes(clearance_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, role = %args.role, "clearance portal backend ready");

    axum::serve(listener, app).await?;
    Ok(())
}
