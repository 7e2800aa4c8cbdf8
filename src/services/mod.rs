pub mod task_service;

pub use task_service::{SaveOutcome, TaskService, format_timestamp};
