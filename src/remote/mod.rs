pub mod dto;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::error::AppError;
use crate::remote::dto::{RemoteTodo, TodoListResponse};

#[async_trait]
pub trait TodoClient: Send + Sync {
    async fn fetch_todos(&self) -> Result<Vec<RemoteTodo>, AppError>;
}

pub struct HttpTodoClient {
    client: Client,
    url: Url,
}

impl HttpTodoClient {
    pub fn new(url: &str) -> Result<Self, AppError> {
        let url = Url::parse(url).map_err(|_| AppError::InvalidUrl(url.to_string()))?;
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Network(format!("failed to build http client: {}", e)))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TodoClient for HttpTodoClient {
    async fn fetch_todos(&self) -> Result<Vec<RemoteTodo>, AppError> {
        let response = self.client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        // Only a plain 200 counts as success.
        if response.status() != StatusCode::OK {
            return Err(AppError::Network(format!(
                "todo endpoint returned status {}",
                response.status()
            )));
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| AppError::Network(e.to_string()))?;

        let parsed: TodoListResponse = serde_json::from_str(&body_text).map_err(|e| {
            tracing::error!("failed to parse todo response: {}", e);
            AppError::Decode(e.to_string())
        })?;

        Ok(parsed.todos)
    }
}

pub struct NoopTodoClient;

#[async_trait]
impl TodoClient for NoopTodoClient {
    async fn fetch_todos(&self) -> Result<Vec<RemoteTodo>, AppError> {
        Ok(Vec::new())
    }
}
