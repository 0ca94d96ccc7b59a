use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Broker connection error: {0}")]
    BrokerConnection(String),

    #[error("Broker configuration error: {0}")]
    BrokerConfiguration(String),

    #[error("Task execution error: {0}")]
    TaskExecution(String),

    #[error("Task execution timeout: {0}")]
    TaskTimeout(String),
}

impl JobError {
    /// Connection and timeout failures may clear up on their own;
    /// configuration and execution failures will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::BrokerConnection(_) | JobError::TaskTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_mark_connection_errors_retryable() {
        assert!(JobError::BrokerConnection("down".to_string()).is_retryable());
        assert!(JobError::TaskTimeout("slow".to_string()).is_retryable());
        assert!(!JobError::BrokerConfiguration("bad".to_string()).is_retryable());
        assert!(!JobError::TaskExecution("boom".to_string()).is_retryable());
    }

    #[test]
    fn should_format_error_messages() {
        let err = JobError::BrokerConfiguration("visibility timeout must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Broker configuration error: visibility timeout must be > 0"
        );
    }
}
