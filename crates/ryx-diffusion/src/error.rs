use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiffusionError {
    #[error("no executor registered for task type {0}")]
    NoExecutor(String),
    #[error("executor for {0} failed: {1}")]
    ExecutorFailed(String, String),
}
