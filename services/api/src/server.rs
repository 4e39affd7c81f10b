use crate::cli::ServeArgs;
use crate::infra::{AppState, TrackerContext};
use crate::routes::with_tracker_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use jc_tracker::config::AppConfig;
use jc_tracker::error::AppError;
use jc_tracker::telemetry;
use jc_tracker::workflows::tracker::InMemorySnapshotRepository;
use std::sync::atomic::{AtomicBool, Ordering};
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
    if let Some(dir) = args.documents_dir.take() {
        config.source.documents_dir = dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    // Snapshots live as long as this process.
    let repository = Arc::new(InMemorySnapshotRepository::default());
    let context = Arc::new(TrackerContext::from_config(&config.source, repository)?);

    let app = with_tracker_routes(context)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        documents = %config.source.documents_dir.display(),
        "jc tracker service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
