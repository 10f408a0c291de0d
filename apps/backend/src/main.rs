use actix_web::{web, App, HttpServer};
use matchroom::config::AppConfig;
use matchroom::infra::state::build_state;
use matchroom::middleware::cors::cors_middleware;
use matchroom::middleware::request_trace::RequestTrace;
use matchroom::middleware::structured_logger::StructuredLogger;
use matchroom::middleware::trace_span::TraceSpan;
use matchroom::routes;
use matchroom::services::spawn_sweeper;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    let (host, port) = config.bind_addr();
    let (sweep_every, session_ttl) = (config.sweep_interval, config.session_ttl);

    let app_state = match build_state().with_config(config).build().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to build application state");
            std::process::exit(1);
        }
    };

    let sweeper = spawn_sweeper(app_state.coordinator.clone(), sweep_every, session_ttl);
    info!(
        sweep_every_secs = sweep_every.as_secs(),
        session_ttl_secs = session_ttl.as_secs(),
        "Session sweeper started"
    );

    info!(%host, port, "Starting matchroom");

    let data = web::Data::new(app_state);

    let result = HttpServer::new(move || {
        App::new()
            .wrap(TraceSpan)
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .wrap(cors_middleware())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await;

    sweeper.abort();
    result
}
