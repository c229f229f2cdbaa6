use anyhow::Context;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use orm_lifecycle::database::SeaOrmClient;
use orm_lifecycle::prelude::*;
use serde_json::{Value, json};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

type Db = SharedDatabaseService<SeaOrmClient>;

async fn health(State(db): State<Db>) -> (StatusCode, Json<Value>) {
    let state = db.read().await.state();
    let status = if state == ConnectionState::Connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "database": state.as_ref() })))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ConfigService::new();
    let db_config = DatabaseConfig::from_config(&config)?;
    tracing::info!(url = %db_config.redacted_url(), "Starting example server");

    let init_timeout = db_config.connect_timeout + Duration::from_secs(5);
    let mut container = ContainerBuilder::new().register(db_config).build();
    DatabaseModule::<SeaOrmClient>::register(&mut container)?;
    let db = DatabaseModule::<SeaOrmClient>::resolve(&container)?;

    let app = Application::builder()
        .container(container)
        .register_lifecycle(Arc::clone(&db), "DatabaseService")
        .init_timeout(init_timeout)
        .destroy_timeout(Duration::from_secs(10))
        .build()
        .await
        .context("failed to initialize application")?;

    db.read().await.enable_shutdown_hooks(&app)?;

    let router = Router::new()
        .route("/health", get(health))
        .with_state(Arc::clone(&db));

    let host = config.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = config.get("PORT").unwrap_or_else(|| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
    tracing::info!("Listening on http://{host}:{port}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { app.wait_closed().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
