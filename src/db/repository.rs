use sqlx::SqlitePool;

use crate::models::Task;

/// Full scan in insertion order. `created_at` is opaque display text, so
/// rowid is the only ordering the store can offer.
pub async fn list_tasks(db: &SqlitePool) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT id, title, task_description, is_completed, created_at FROM tasks ORDER BY rowid",
    )
    .fetch_all(db)
    .await
}

/// Appends each task as a new row. Rows are never deduplicated by id —
/// callers are responsible for not re-inserting an existing task.
pub async fn insert_tasks(db: &SqlitePool, tasks: &[Task]) -> Result<(), sqlx::Error> {
    for task in tasks {
        sqlx::query(
            "INSERT INTO tasks (id, title, task_description, is_completed, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.is_completed)
        .bind(&task.created_at)
        .execute(db)
        .await?;
    }
    Ok(())
}

/// Overwrites the mutable columns of the row matching `task.id`.
/// Silently succeeds when no row matches; `created_at` is never rewritten.
pub async fn update_task(db: &SqlitePool, task: &Task) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tasks SET title = ?, task_description = ?, is_completed = ? WHERE id = ?")
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.is_completed)
        .bind(&task.id)
        .execute(db)
        .await?;
    Ok(())
}

/// Removes the rows matching `id`. Silently succeeds when none match.
pub async fn delete_task(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
