use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasklist::api::router;
use tasklist::remote::HttpTodoClient;
use tasklist::services::TaskService;
use tasklist::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tasklist=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://tasks.db?mode=rwc".to_string());
    let seed_url = std::env::var("SEED_URL")
        .unwrap_or_else(|_| "https://dummyjson.com/todos".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let remote = Arc::new(HttpTodoClient::new(&seed_url)?);
    let mut service = TaskService::new(pool.clone(), remote);

    match service.bootstrap().await {
        Ok(tasks) => info!("bootstrapped with {} tasks", tasks.len()),
        Err(err) => warn!("bootstrap failed, continuing with an empty task list: {}", err),
    }

    let state = AppState {
        db: pool.clone(),
        service: Arc::new(Mutex::new(service)),
    };

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
