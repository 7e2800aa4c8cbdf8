use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::repository;
use crate::error::AppError;
use crate::models::Task;
use crate::remote::TodoClient;

/// Renders an instant with the fixed `dd/MM/yy` pattern used for task
/// creation dates. Always UTC, independent of locale.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%d/%m/%y").to_string()
}

/// How `save` routed a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

/// Mediates between the remote seed endpoint, the local store, and the
/// in-memory task cache. The cache is the authoritative ordered view; the
/// store is its durable mirror.
///
/// Cache-mutating operations take `&mut self`, so a single owner drives them
/// one at a time. Persistence runs after the cache mutation and is not rolled
/// back when it fails; the error is forwarded to the caller unchanged.
pub struct TaskService {
    db: SqlitePool,
    remote: Arc<dyn TodoClient>,
    tasks: Vec<Task>,
}

impl TaskService {
    pub fn new(db: SqlitePool, remote: Arc<dyn TodoClient>) -> Self {
        Self {
            db,
            remote,
            tasks: Vec::new(),
        }
    }

    /// Adopts the stored tasks when the local store has any; otherwise seeds
    /// the store from the remote endpoint. Seeded tasks get fresh ids and
    /// are persisted in one pass.
    pub async fn bootstrap(&mut self) -> Result<Vec<Task>, AppError> {
        let stored = repository::list_tasks(&self.db).await?;
        if !stored.is_empty() {
            info!("loaded {} tasks from the local store", stored.len());
            self.tasks = stored;
            return Ok(self.tasks.clone());
        }

        let todos = self.remote.fetch_todos().await?;
        let created_at = format_timestamp(Utc::now());
        self.tasks = todos
            .iter()
            .map(|todo| Task::from_remote(todo, created_at.clone()))
            .collect();
        repository::insert_tasks(&self.db, &self.tasks).await?;
        info!("seeded {} tasks from the remote endpoint", self.tasks.len());
        Ok(self.tasks.clone())
    }

    pub async fn create(&mut self, task: Task) -> Result<(), AppError> {
        self.tasks.push(task.clone());
        repository::insert_tasks(&self.db, std::slice::from_ref(&task)).await?;
        debug!("created task {}", task.id);
        Ok(())
    }

    /// Replaces the cache entry matching `task.id` and persists the change.
    /// A silent no-op when the id is unknown, matching the store.
    pub async fn update(&mut self, task: Task) -> Result<(), AppError> {
        let Some(slot) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Ok(());
        };
        *slot = task.clone();
        repository::update_task(&self.db, &task).await?;
        debug!("updated task {}", task.id);
        Ok(())
    }

    /// Drops every cache entry with the task's id and persists the delete.
    pub async fn delete(&mut self, task: &Task) -> Result<(), AppError> {
        self.tasks.retain(|t| t.id != task.id);
        repository::delete_task(&self.db, &task.id).await?;
        debug!("deleted task {}", task.id);
        Ok(())
    }

    /// Routes a task to `update` when its id is already cached, `create`
    /// otherwise.
    pub async fn save(&mut self, task: Task) -> Result<SaveOutcome, AppError> {
        if self.tasks.iter().any(|t| t.id == task.id) {
            self.update(task).await?;
            Ok(SaveOutcome::Updated)
        } else {
            self.create(task).await?;
            Ok(SaveOutcome::Created)
        }
    }

    /// The cache snapshot. No I/O.
    pub fn current_tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Case-insensitive substring match against title or description over
    /// the cache. The empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<Task> {
        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::remote::NoopTodoClient;
    use crate::remote::dto::RemoteTodo;

    struct StubTodoClient {
        todos: Vec<RemoteTodo>,
        calls: AtomicUsize,
    }

    impl StubTodoClient {
        fn new(todos: Vec<RemoteTodo>) -> Self {
            Self {
                todos,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TodoClient for StubTodoClient {
        async fn fetch_todos(&self) -> Result<Vec<RemoteTodo>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.todos.clone())
        }
    }

    struct FailingTodoClient;

    #[async_trait]
    impl TodoClient for FailingTodoClient {
        async fn fetch_todos(&self) -> Result<Vec<RemoteTodo>, AppError> {
            Err(AppError::Network("connection refused".to_string()))
        }
    }

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test db");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn remote_todo(id: i64, text: &str, completed: bool) -> RemoteTodo {
        RemoteTodo {
            id,
            todo: text.to_string(),
            completed,
        }
    }

    fn task(title: &str, description: &str) -> Task {
        let mut t = Task::new(format_timestamp(Utc::now()));
        t.title = title.to_string();
        t.description = description.to_string();
        t
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_from_remote_when_store_is_empty() {
        let pool = setup_test_db().await;
        let remote = Arc::new(StubTodoClient::new(vec![
            remote_todo(1, "Buy milk", false),
            remote_todo(2, "Walk the dog", true),
        ]));
        let mut service = TaskService::new(pool.clone(), remote.clone());

        let tasks = service.bootstrap().await.expect("Bootstrap failed");

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "Buy milk");
        assert_eq!(tasks[0].description, "Buy milk");
        assert!(!tasks[0].is_completed);
        assert!(tasks[1].is_completed);
        assert_ne!(tasks[0].id, tasks[1].id);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);

        // Persisted exactly once: the store mirrors the cache row for row.
        let stored = repository::list_tasks(&pool).await.expect("List failed");
        assert_eq!(stored, tasks);
    }

    #[tokio::test]
    async fn test_bootstrap_prefers_local_store() {
        let pool = setup_test_db().await;
        let existing = task("already here", "stored earlier");
        repository::insert_tasks(&pool, std::slice::from_ref(&existing))
            .await
            .expect("Insert failed");

        let remote = Arc::new(StubTodoClient::new(vec![remote_todo(1, "unused", false)]));
        let mut service = TaskService::new(pool, remote.clone());

        let tasks = service.bootstrap().await.expect("Bootstrap failed");

        assert_eq!(tasks, vec![existing]);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_forwards_remote_failure() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(FailingTodoClient));

        let err = service.bootstrap().await.expect_err("Bootstrap should fail");
        assert!(matches!(err, AppError::Network(_)));
        assert!(service.current_tasks().is_empty());
    }

    #[tokio::test]
    async fn test_create_appends_to_cache_and_store() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool.clone(), Arc::new(NoopTodoClient));

        let t = task("new task", "details");
        service.create(t.clone()).await.expect("Create failed");

        let matching: Vec<_> = service
            .current_tasks()
            .iter()
            .filter(|c| c.id == t.id)
            .collect();
        assert_eq!(matching.len(), 1);

        let stored = repository::list_tasks(&pool).await.expect("List failed");
        assert_eq!(stored, vec![t]);
    }

    #[tokio::test]
    async fn test_create_keeps_cache_mutation_when_persistence_fails() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool.clone(), Arc::new(NoopTodoClient));

        pool.close().await;

        let t = task("unsaved", "the store is gone");
        let err = service.create(t.clone()).await.expect_err("Create should fail");
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(service.current_tasks(), &[t]);
    }

    #[tokio::test]
    async fn test_update_touches_only_the_target() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(NoopTodoClient));

        let mut target = task("A", "first");
        let other = task("other", "second");
        service.create(target.clone()).await.expect("Create failed");
        service.create(other.clone()).await.expect("Create failed");

        target.title = "B".to_string();
        service.update(target.clone()).await.expect("Update failed");

        let tasks = service.current_tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "B");
        assert_eq!(tasks[1], other);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(NoopTodoClient));

        service.create(task("kept", "")).await.expect("Create failed");
        service
            .update(task("phantom", ""))
            .await
            .expect("Update should not error");

        assert_eq!(service.current_tasks().len(), 1);
        assert_eq!(service.current_tasks()[0].title, "kept");
    }

    #[tokio::test]
    async fn test_delete_removes_matching_id_only() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool.clone(), Arc::new(NoopTodoClient));

        let doomed = task("doomed", "");
        let kept = task("kept", "");
        service.create(doomed.clone()).await.expect("Create failed");
        service.create(kept.clone()).await.expect("Create failed");

        service.delete(&doomed).await.expect("Delete failed");

        assert_eq!(service.current_tasks(), &[kept.clone()]);
        let stored = repository::list_tasks(&pool).await.expect("List failed");
        assert_eq!(stored, vec![kept]);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(NoopTodoClient));

        service.create(task("kept", "")).await.expect("Create failed");
        service
            .delete(&task("phantom", ""))
            .await
            .expect("Delete should not error");

        assert_eq!(service.current_tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_save_routes_known_id_to_update() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(NoopTodoClient));

        let mut t = task("v1", "");
        service.create(t.clone()).await.expect("Create failed");

        t.title = "v2".to_string();
        let outcome = service.save(t).await.expect("Save failed");

        assert_eq!(outcome, SaveOutcome::Updated);
        assert_eq!(service.current_tasks().len(), 1);
        assert_eq!(service.current_tasks()[0].title, "v2");
    }

    #[tokio::test]
    async fn test_save_routes_unknown_id_to_create() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(NoopTodoClient));

        let outcome = service.save(task("fresh", "")).await.expect("Save failed");

        assert_eq!(outcome, SaveOutcome::Created);
        assert_eq!(service.current_tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_search_matches_title_or_description_case_insensitively() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(NoopTodoClient));

        service
            .create(task("Test function", "Test function"))
            .await
            .expect("Create failed");
        service
            .create(task("Test classes", "Test classes"))
            .await
            .expect("Create failed");

        let hits = service.search("fun");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Test function");

        let hits = service.search("FUNCTION");
        assert_eq!(hits.len(), 1);

        let hits = service.search("");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_search_matches_description_alone() {
        let pool = setup_test_db().await;
        let mut service = TaskService::new(pool, Arc::new(NoopTodoClient));

        service
            .create(task("errand", "pick up the laundry"))
            .await
            .expect("Create failed");

        let hits = service.search("laundry");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "errand");
    }

    #[test]
    fn test_format_timestamp_at_epoch() {
        assert_eq!(format_timestamp(DateTime::UNIX_EPOCH), "01/01/70");
    }
}
