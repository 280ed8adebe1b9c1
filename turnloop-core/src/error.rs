#[derive(Debug, thiserror::Error)]
pub enum TurnloopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Worker '{worker}' failed: {message}")]
    Worker { worker: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TurnloopError {
    pub fn worker(worker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Worker { worker: worker.into(), message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, TurnloopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TurnloopError::Config("max_iterations must be at least 1".to_string());
        assert_eq!(err.to_string(), "Configuration error: max_iterations must be at least 1");
    }

    #[test]
    fn test_worker_error_display() {
        let err = TurnloopError::worker("writer", "draft unavailable");
        assert_eq!(err.to_string(), "Worker 'writer' failed: draft unavailable");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TurnloopError = io_err.into();
        assert!(matches!(err, TurnloopError::Io(_)));
    }
}
