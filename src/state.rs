use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::services::TaskService;

/// The mutex serializes callers so cache mutations never overlap.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub service: Arc<Mutex<TaskService>>,
}
