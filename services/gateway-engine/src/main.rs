use actix_web::{web, App, HttpServer};
use adapters::HttpSchemeClient;
use anyhow::Context;
use gateway_engine::catalog::AdapterCatalog;
use gateway_engine::config::Config;
use gateway_engine::correlator::Correlator;
use gateway_engine::database::{
    self, AdapterRepository, FlowRepository, MessageLogRepository, ResiliencyConfigRepository,
};
use gateway_engine::flow::MessageFlowEngine;
use gateway_engine::handlers::{self, AppState};
use gateway_engine::idempotency::IdempotencyGate;
use gateway_engine::monitor::{HealthCheckConfig, MonitorContext, SelfHealingMonitor};
use gateway_engine::queue_store::QueueStore;
use resiliency::{PolicyRegistry, ResiliencyExecutor, ResiliencyPolicy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Exit codes: 0 clean shutdown, 1 startup failure, 2 configuration
/// invalid, 3 unrecoverable runtime error.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("configuration invalid: {}", e);
            std::process::exit(2);
        }
    };

    let code = actix_web::rt::System::new().block_on(run(config));
    std::process::exit(code);
}

/// A fully started gateway, ready to serve
struct Gateway {
    server: actix_web::dev::Server,
    executor: Arc<ResiliencyExecutor>,
    monitor: SelfHealingMonitor,
}

async fn run(config: Arc<Config>) -> i32 {
    let gateway = match start(config.clone()).await {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("startup failed: {:#}", e);
            return 1;
        }
    };
    info!(
        host = %config.server.host,
        port = config.server.http_port,
        "gateway engine listening"
    );

    let outcome = gateway.server.await;

    // Teardown in reverse init order: stop admission, let in-flight
    // work finish (actix already drained it), then the monitor.
    gateway.executor.shutdown();
    let mut monitor = gateway.monitor;
    if let Err(e) = monitor.stop().await {
        error!("monitor shutdown failed: {}", e);
    }
    info!("gateway engine stopped");

    match outcome {
        Ok(()) => 0,
        Err(e) => {
            error!("unrecoverable runtime error: {:#}", anyhow::Error::from(e));
            3
        }
    }
}

async fn start(config: Arc<Config>) -> anyhow::Result<Gateway> {
    info!(
        system_id = %config.gateway.system_id,
        "gateway engine starting"
    );

    let pool = database::create_pool(&config.database)
        .await
        .context("datastore pool")?;

    let catalog = Arc::new(AdapterCatalog::new());
    let adapters_loaded = AdapterRepository::new(pool.clone())
        .load_all()
        .await
        .context("clearing adapter load")?;
    info!(count = adapters_loaded.len(), "clearing adapters loaded");
    catalog.replace(adapters_loaded);

    let config_rows = ResiliencyConfigRepository::new(pool.clone())
        .load_all()
        .await
        .context("resiliency configuration load")?;
    let mut policies: HashMap<String, ResiliencyPolicy> = HashMap::new();
    let mut health_checks: HashMap<String, HealthCheckConfig> = HashMap::new();
    for row in config_rows {
        match serde_json::from_value::<ResiliencyPolicy>(row.policy.clone()) {
            Ok(policy) => {
                policies.insert(row.service_name.clone(), policy);
            }
            Err(e) => error!(
                service = %row.service_name,
                "unreadable resiliency policy, using defaults: {}", e
            ),
        }
        health_checks.insert(
            row.service_name.clone(),
            HealthCheckConfig {
                method: row.health_check_method,
                endpoint: row.health_check_endpoint,
                expected_statuses: row
                    .expected_statuses
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|s| u16::try_from(s).ok())
                    .collect(),
            },
        );
    }
    info!(count = policies.len(), "resiliency policies loaded");

    let executor = Arc::new(ResiliencyExecutor::new(Arc::new(PolicyRegistry::new(
        policies,
        ResiliencyPolicy::default(),
    ))));
    let correlator = Arc::new(Correlator::new());
    let flows = FlowRepository::new(pool.clone());
    let queue = QueueStore::new(pool.clone());
    let connector = Arc::new(
        HttpSchemeClient::new(adapters::DEFAULT_ADAPTER_TIMEOUT_SECONDS)
            .context("scheme client")?,
    );

    let engine = Arc::new(
        MessageFlowEngine::new(
            config.clone(),
            catalog.clone(),
            executor.clone(),
            correlator,
            flows.clone(),
            MessageLogRepository::new(pool.clone()),
            queue.clone(),
            connector.clone(),
        )
        .context("flow engine")?,
    );

    let monitor_context = Arc::new(MonitorContext::new(
        config.clone(),
        catalog,
        executor.clone(),
        queue,
        engine.clone(),
        connector,
        health_checks,
    ));
    let monitor = SelfHealingMonitor::start(monitor_context.clone())
        .await
        .context("self-healing monitor")?;

    let bind_address = (config.server.host.clone(), config.server.http_port);
    let drain_window = config.gateway.shutdown_drain_seconds;

    let state_config = config.clone();
    let state_executor = executor.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(AppState {
                config: state_config.clone(),
                engine: engine.clone(),
                executor: state_executor.clone(),
                monitor: monitor_context.clone(),
                gate: IdempotencyGate::new(pool.clone()),
                flows: flows.clone(),
            }))
            .configure(handlers::configure)
    })
    .shutdown_timeout(drain_window)
    .bind(bind_address)
    .context("http bind")?
    .run();

    Ok(Gateway {
        server,
        executor,
        monitor,
    })
}
