use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::remote::dto::RemoteTodo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[sqlx(rename = "task_description")]
    pub description: String,
    pub is_completed: bool,
    pub created_at: String,
}

impl Task {
    /// A blank task for the user to fill in, stamped with its creation date.
    pub fn new(created_at: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            description: String::new(),
            is_completed: false,
            created_at,
        }
    }

    /// Maps a remote todo onto a fresh local task. The remote integer id is
    /// discarded; local ids never come from the seed endpoint.
    pub fn from_remote(todo: &RemoteTodo, created_at: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: todo.todo.clone(),
            description: todo.todo.clone(),
            is_completed: todo.completed,
            created_at,
        }
    }
}
