use events::EventPublisher;
use log::*;
use realtime::domain_event_handler::RealtimeEventHandler;
use service::config::Config;
use service::logging::Logger;
use service::AppState;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();

    Logger::init_logger(&config);

    info!(
        "Starting RideLink Platform API (env: {}, api version: {})",
        config.runtime_env,
        config.api_version()
    );

    let db = Arc::new(
        service::init_database(&config)
            .await
            .expect("Failed to connect to the database"),
    );

    let realtime_manager = if config.disable_realtime {
        warn!("Real-time layer disabled; notifications will be dropped");
        None
    } else {
        Some(Arc::new(realtime::Manager::new()))
    };

    let event_publisher = EventPublisher::new()
        .with_handler(Arc::new(RealtimeEventHandler::new(realtime_manager.clone())));

    let app_state = AppState::new(config.clone(), &db, event_publisher, realtime_manager);

    let router = web::define_routes(app_state);

    let interface = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{}:{}", interface, config.port);
    info!("Server starting... listening for requests on http://{listen_addr}");

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {listen_addr}: {e}"));

    axum::serve(listener, router)
        .await
        .expect("Server stopped unexpectedly");
}
