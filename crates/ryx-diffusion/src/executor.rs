//! The Task Executor contract (spec §4.6): an external collaborator the
//! node holds a registry of, looked up by `task.type` when a `task`
//! message is received.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("executor error: {0}")]
pub struct ExecutorError(pub String);

/// A task payload handed to an executor: the parsed `{type, data,
/// parameters}` envelope the control surface's task-inject endpoint
/// produces (spec §6.2).
#[derive(Debug, Clone)]
pub struct Task {
    pub task_type: String,
    pub data: Vec<u8>,
    pub parameters: serde_json::Value,
}

/// Execution must be deterministic per input — identical inputs produce
/// identical result bytes — since that is what makes content-addressed
/// consensus across nodes work (spec §4.6). Non-deterministic executors
/// are out of scope for consensus guarantees.
pub trait TaskExecutor: Send + Sync {
    fn kind(&self) -> &str;
    fn accepts(&self, kind: &str) -> bool {
        self.kind() == kind
    }
    fn execute(&self, task: &Task) -> Result<Vec<u8>, ExecutorError>;
}

#[derive(Default)]
pub struct TaskRegistry {
    executors: HashMap<String, Box<dyn TaskExecutor>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, executor: Box<dyn TaskExecutor>) {
        self.executors.insert(executor.kind().to_string(), executor);
    }

    pub fn lookup(&self, task_type: &str) -> Option<&dyn TaskExecutor> {
        self.executors
            .values()
            .find(|e| e.accepts(task_type))
            .map(|b| b.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl TaskExecutor for Echo {
        fn kind(&self) -> &str {
            "echo"
        }
        fn execute(&self, task: &Task) -> Result<Vec<u8>, ExecutorError> {
            Ok(task.data.clone())
        }
    }

    #[test]
    fn lookup_finds_registered_executor() {
        let mut registry = TaskRegistry::new();
        registry.register(Box::new(Echo));
        let executor = registry.lookup("echo").expect("registered");
        let task = Task {
            task_type: "echo".to_string(),
            data: b"hi".to_vec(),
            parameters: serde_json::Value::Null,
        };
        assert_eq!(executor.execute(&task).unwrap(), b"hi");
    }

    #[test]
    fn lookup_misses_unknown_type() {
        let registry = TaskRegistry::new();
        assert!(registry.lookup("nonexistent").is_none());
    }

    #[test]
    fn same_input_yields_same_output() {
        let echo = Echo;
        let task = Task {
            task_type: "echo".to_string(),
            data: b"deterministic".to_vec(),
            parameters: serde_json::Value::Null,
        };
        assert_eq!(echo.execute(&task).unwrap(), echo.execute(&task).unwrap());
    }
}
