use std::collections::HashMap;
use std::time::Duration;

use mindbridge_core::config::JobsConfig;
use mindbridge_core::JobKind;
use serde::{Deserialize, Serialize};

use crate::errors::JobError;

const VALID_SERIALIZERS: &[&str] = &["json", "msgpack"];

/// Validated broker settings for the background-job queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub broker_url: String,
    pub result_backend: String,
    pub task_serializer: String,
    pub accept_content: Vec<String>,
    pub visibility_timeout_secs: u64,
    pub soft_time_limit_secs: u64,
    pub time_limit_secs: u64,
    pub prefetch_multiplier: u32,
}

impl BrokerConfig {
    pub fn new(broker_url: impl Into<String>) -> Result<Self, JobError> {
        let broker_url = broker_url.into();
        let config = Self {
            result_backend: broker_url.clone(),
            broker_url,
            task_serializer: "json".to_string(),
            accept_content: vec!["json".to_string()],
            visibility_timeout_secs: 3600,
            soft_time_limit_secs: 300,
            time_limit_secs: 600,
            prefetch_multiplier: 4,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build broker settings from the application config, falling back to the
    /// shared Redis URL when no dedicated broker URL is configured.
    pub fn from_settings(settings: &JobsConfig, redis_url: &str) -> Result<Self, JobError> {
        let config = Self {
            broker_url: settings.broker_url_or(redis_url).to_string(),
            result_backend: settings.broker_url_or(redis_url).to_string(),
            task_serializer: "json".to_string(),
            accept_content: vec!["json".to_string()],
            visibility_timeout_secs: settings.visibility_timeout_secs,
            soft_time_limit_secs: settings.soft_time_limit_secs,
            time_limit_secs: settings.time_limit_secs,
            prefetch_multiplier: settings.prefetch_multiplier,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.broker_url.is_empty() {
            return Err(JobError::BrokerConfiguration(
                "broker url must not be empty".to_string(),
            ));
        }
        if !VALID_SERIALIZERS.contains(&self.task_serializer.as_str()) {
            return Err(JobError::BrokerConfiguration(format!(
                "invalid task serializer: {}",
                self.task_serializer
            )));
        }
        if self.accept_content.is_empty() {
            return Err(JobError::BrokerConfiguration(
                "accept content must not be empty".to_string(),
            ));
        }
        for content_type in &self.accept_content {
            if !VALID_SERIALIZERS.contains(&content_type.as_str()) {
                return Err(JobError::BrokerConfiguration(format!(
                    "invalid content type: {}",
                    content_type
                )));
            }
        }
        if self.visibility_timeout_secs == 0 {
            return Err(JobError::BrokerConfiguration(
                "visibility timeout must be > 0".to_string(),
            ));
        }
        if self.soft_time_limit_secs == 0 {
            return Err(JobError::BrokerConfiguration(
                "soft time limit must be > 0".to_string(),
            ));
        }
        if self.time_limit_secs <= self.soft_time_limit_secs {
            return Err(JobError::BrokerConfiguration(
                "time limit must be greater than soft time limit".to_string(),
            ));
        }
        if self.prefetch_multiplier == 0 {
            return Err(JobError::BrokerConfiguration(
                "prefetch multiplier must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A recurring maintenance task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub name: String,
    pub kind: JobKind,
    pub interval_secs: u64,
}

impl ScheduledTask {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Routing of job kinds to named queues plus the periodic schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub routes: HashMap<JobKind, String>,
    pub schedule: Vec<ScheduledTask>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        let routes = HashMap::from([
            (JobKind::Clone, "indexing".to_string()),
            (JobKind::Analysis, "document_processing".to_string()),
            (JobKind::Embedding, "embeddings".to_string()),
            (JobKind::Indexing, "indexing".to_string()),
            (JobKind::Cleanup, "maintenance".to_string()),
        ]);

        let schedule = vec![
            ScheduledTask {
                name: "cleanup-expired-cache".to_string(),
                kind: JobKind::Cleanup,
                interval_secs: 3600,
            },
            ScheduledTask {
                name: "update-search-indexes".to_string(),
                kind: JobKind::Indexing,
                interval_secs: 1800,
            },
        ];

        Self { routes, schedule }
    }
}

impl QueueConfig {
    /// Queue a kind routes to; unrouted kinds land on the default queue.
    pub fn queue_for(&self, kind: JobKind) -> &str {
        self.routes
            .get(&kind)
            .map(String::as_str)
            .unwrap_or("default")
    }

    pub fn queue_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.values().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_broker_config() {
        let config = BrokerConfig::new("redis://localhost:6379").unwrap();

        assert_eq!(config.broker_url, "redis://localhost:6379");
        assert_eq!(config.result_backend, config.broker_url);
        assert_eq!(config.task_serializer, "json");
        assert_eq!(config.visibility_timeout_secs, 3600);
    }

    #[test]
    fn should_reject_empty_broker_url() {
        let result = BrokerConfig::new("");
        assert!(matches!(result, Err(JobError::BrokerConfiguration(_))));
    }

    #[test]
    fn should_reject_invalid_serializer() {
        let mut config = BrokerConfig::new("redis://localhost:6379").unwrap();
        config.task_serializer = "pickle".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(JobError::BrokerConfiguration(_))));
        assert!(result.unwrap_err().to_string().contains("pickle"));
    }

    #[test]
    fn should_reject_empty_accept_content() {
        let mut config = BrokerConfig::new("redis://localhost:6379").unwrap();
        config.accept_content.clear();

        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_invalid_accept_content_entry() {
        let mut config = BrokerConfig::new("redis://localhost:6379").unwrap();
        config.accept_content = vec!["json".to_string(), "yaml".to_string()];

        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_visibility_timeout() {
        let mut config = BrokerConfig::new("redis://localhost:6379").unwrap();
        config.visibility_timeout_secs = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn should_require_time_limit_above_soft_limit() {
        let mut config = BrokerConfig::new("redis://localhost:6379").unwrap();
        config.soft_time_limit_secs = 600;
        config.time_limit_secs = 600;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("greater than soft time limit"));
    }

    #[test]
    fn should_build_from_application_settings() {
        let settings = JobsConfig {
            broker_url: None,
            visibility_timeout_secs: 1800,
            soft_time_limit_secs: 120,
            time_limit_secs: 240,
            prefetch_multiplier: 2,
        };

        let config = BrokerConfig::from_settings(&settings, "redis://localhost:6379").unwrap();
        assert_eq!(config.broker_url, "redis://localhost:6379");
        assert_eq!(config.visibility_timeout_secs, 1800);

        let settings = JobsConfig {
            broker_url: Some("redis://broker:6380".to_string()),
            ..settings
        };
        let config = BrokerConfig::from_settings(&settings, "redis://localhost:6379").unwrap();
        assert_eq!(config.broker_url, "redis://broker:6380");
    }

    #[test]
    fn should_route_job_kinds_to_queues() {
        let config = QueueConfig::default();

        assert_eq!(config.queue_for(JobKind::Analysis), "document_processing");
        assert_eq!(config.queue_for(JobKind::Embedding), "embeddings");
        assert_eq!(config.queue_for(JobKind::Indexing), "indexing");
        assert_eq!(config.queue_for(JobKind::Clone), "indexing");
        assert_eq!(config.queue_for(JobKind::Cleanup), "maintenance");
    }

    #[test]
    fn should_list_distinct_queue_names() {
        let config = QueueConfig::default();
        let names = config.queue_names();

        assert!(names.contains(&"document_processing"));
        assert!(names.contains(&"embeddings"));
        assert!(names.contains(&"indexing"));
        assert!(names.contains(&"maintenance"));
        // clone and indexing share a queue, so names stay deduplicated
        assert_eq!(names.iter().filter(|n| **n == "indexing").count(), 1);
    }

    #[test]
    fn should_define_periodic_schedule() {
        let config = QueueConfig::default();

        let cleanup = config
            .schedule
            .iter()
            .find(|t| t.name == "cleanup-expired-cache")
            .unwrap();
        assert_eq!(cleanup.kind, JobKind::Cleanup);
        assert_eq!(cleanup.interval(), Duration::from_secs(3600));

        let reindex = config
            .schedule
            .iter()
            .find(|t| t.name == "update-search-indexes")
            .unwrap();
        assert_eq!(reindex.interval(), Duration::from_secs(1800));
    }
}
