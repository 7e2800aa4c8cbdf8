use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::models::Task;
use crate::services::{SaveOutcome, TaskService, format_timestamp};

/// State transitions pushed to whatever renders the task list. `Loading`
/// resolves to either `ShowTasks` or `Error`; `TaskAdded` and `TaskUpdated`
/// are point mutations applied to a currently shown list. `Error` is a
/// transient notice — the list on screen stays as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Loading,
    ShowTasks(Vec<Task>),
    Error(String),
    TaskAdded(Task),
    TaskUpdated(Task),
}

/// Translates task mediator results into view events. Owns the mediator
/// outright; the view holds the receiving end of the channel and nothing
/// holds a reference back.
pub struct TaskListPresenter {
    service: TaskService,
    events: UnboundedSender<ViewEvent>,
}

impl TaskListPresenter {
    pub fn new(service: TaskService, events: UnboundedSender<ViewEvent>) -> Self {
        Self { service, events }
    }

    pub async fn load(&mut self) {
        self.emit(ViewEvent::Loading);
        match self.service.bootstrap().await {
            Ok(tasks) => self.emit(ViewEvent::ShowTasks(tasks)),
            Err(err) => self.emit(ViewEvent::Error(err.to_string())),
        }
    }

    /// A blank task for the detail screen, stamped with today's date.
    pub fn new_task(&self) -> Task {
        Task::new(format_timestamp(Utc::now()))
    }

    /// Routes an edited or created task to the right mediator operation and
    /// mirrors the outcome to the view.
    pub async fn task_saved(&mut self, task: Task) {
        match self.service.save(task.clone()).await {
            Ok(SaveOutcome::Created) => self.emit(ViewEvent::TaskAdded(task)),
            Ok(SaveOutcome::Updated) => self.emit(ViewEvent::TaskUpdated(task)),
            Err(err) => self.emit(ViewEvent::Error(err.to_string())),
        }
    }

    /// The view has already dropped the row, so success emits nothing.
    pub async fn task_deleted(&mut self, task: &Task) {
        if let Err(err) = self.service.delete(task).await {
            self.emit(ViewEvent::Error(err.to_string()));
        }
    }

    /// Filters the cache for `query`. The caller cancels `cancel` when a
    /// newer search supersedes this one; a cancelled search delivers
    /// nothing. An empty query re-shows the full list.
    pub fn search(&self, query: &str, cancel: &CancellationToken) {
        if query.is_empty() {
            self.emit(ViewEvent::ShowTasks(self.service.current_tasks().to_vec()));
            return;
        }
        if cancel.is_cancelled() {
            return;
        }
        self.emit(ViewEvent::Loading);
        let hits = self.service.search(query);
        if cancel.is_cancelled() {
            return;
        }
        self.emit(ViewEvent::ShowTasks(hits));
    }

    fn emit(&self, event: ViewEvent) {
        // The view hanging up is not an error the presenter can act on.
        let _ = self.events.send(event);
    }
}
