use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TodoListResponse {
    pub todos: Vec<RemoteTodo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTodo {
    pub id: i64,
    pub todo: String,
    pub completed: bool,
}
