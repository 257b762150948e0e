use crate::actions::sorted_tasks;
use crate::analyzer::TaskAnalyzer;
use crate::breakdown::BreakdownGuard;
use crate::models::{Task, TaskMap};
use crate::store::TaskStore;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub tasks: watch::Receiver<TaskMap>,
    pub analyzer: Arc<dyn TaskAnalyzer>,
    pub breakdown: Arc<BreakdownGuard>,
}

impl AppState {
    pub fn new(store: Arc<dyn TaskStore>, analyzer: Arc<dyn TaskAnalyzer>) -> Self {
        Self {
            tasks: store.subscribe(),
            store,
            analyzer,
            breakdown: Arc::new(BreakdownGuard::default()),
        }
    }

    /// Latest pushed collection keyed by id.
    pub fn task_map(&self) -> TaskMap {
        self.tasks.borrow().clone()
    }

    /// Latest pushed collection, newest first.
    pub fn snapshot(&self) -> Vec<Task> {
        sorted_tasks(&self.tasks.borrow())
    }
}
