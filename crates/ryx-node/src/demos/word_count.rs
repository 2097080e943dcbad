//! A deterministic demo task executor (spec §4.6): counts whitespace-
//! separated words in the task payload. Registered by default so a fresh
//! node has something to dispatch `task` messages to without an external
//! collaborator.

use ryx_diffusion::{ExecutorError, Task, TaskExecutor};

pub struct WordCountExecutor;

impl TaskExecutor for WordCountExecutor {
    fn kind(&self) -> &str {
        "word_count"
    }

    fn execute(&self, task: &Task) -> Result<Vec<u8>, ExecutorError> {
        let text = std::str::from_utf8(&task.data).map_err(|e| ExecutorError(e.to_string()))?;
        let count = text.split_whitespace().count();
        Ok(count.to_string().into_bytes())
    }
}
