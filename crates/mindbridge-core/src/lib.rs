use serde::{Deserialize, Serialize};

pub mod config;

pub use config::Config;

/// Overall health verdict used by health endpoints and checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }

    /// Combine two verdicts, keeping the worst one.
    pub fn merge(self, other: HealthState) -> HealthState {
        use HealthState::*;
        match (self, other) {
            (Unhealthy, _) | (_, Unhealthy) => Unhealthy,
            (Degraded, _) | (_, Degraded) => Degraded,
            _ => Healthy,
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryStatus {
    Pending,
    Cloning,
    Processing,
    Completed,
    Failed,
}

impl RepositoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryStatus::Pending => "pending",
            RepositoryStatus::Cloning => "cloning",
            RepositoryStatus::Processing => "processing",
            RepositoryStatus::Completed => "completed",
            RepositoryStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RepositoryStatus::Pending),
            "cloning" => Some(RepositoryStatus::Cloning),
            "processing" => Some(RepositoryStatus::Processing),
            "completed" => Some(RepositoryStatus::Completed),
            "failed" => Some(RepositoryStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Clone,
    Analysis,
    Embedding,
    Indexing,
    Cleanup,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Clone => "clone",
            JobKind::Analysis => "analysis",
            JobKind::Embedding => "embedding",
            JobKind::Indexing => "indexing",
            JobKind::Cleanup => "cleanup",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "clone" => Some(JobKind::Clone),
            "analysis" => Some(JobKind::Analysis),
            "embedding" => Some(JobKind::Embedding),
            "indexing" => Some(JobKind::Indexing),
            "cleanup" => Some(JobKind::Cleanup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_health_state_lowercase() {
        let json = serde_json::to_string(&HealthState::Healthy).unwrap();
        assert_eq!(json, "\"healthy\"");
        let json = serde_json::to_string(&HealthState::Unhealthy).unwrap();
        assert_eq!(json, "\"unhealthy\"");
        let json = serde_json::to_string(&HealthState::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }

    #[test]
    fn should_merge_health_states_keeping_worst() {
        assert_eq!(
            HealthState::Healthy.merge(HealthState::Healthy),
            HealthState::Healthy
        );
        assert_eq!(
            HealthState::Healthy.merge(HealthState::Unhealthy),
            HealthState::Unhealthy
        );
        assert_eq!(
            HealthState::Degraded.merge(HealthState::Healthy),
            HealthState::Degraded
        );
        assert_eq!(
            HealthState::Degraded.merge(HealthState::Unhealthy),
            HealthState::Unhealthy
        );
    }

    #[test]
    fn should_round_trip_repository_status() {
        for status in [
            RepositoryStatus::Pending,
            RepositoryStatus::Cloning,
            RepositoryStatus::Processing,
            RepositoryStatus::Completed,
            RepositoryStatus::Failed,
        ] {
            assert_eq!(RepositoryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RepositoryStatus::parse("unknown"), None);
    }

    #[test]
    fn should_round_trip_job_kind() {
        for kind in [
            JobKind::Clone,
            JobKind::Analysis,
            JobKind::Embedding,
            JobKind::Indexing,
            JobKind::Cleanup,
        ] {
            assert_eq!(JobKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(JobKind::parse(""), None);
    }

    #[test]
    fn should_identify_terminal_job_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn should_serialize_job_status_lowercase() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        let status: JobStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, JobStatus::Cancelled);
    }
}
