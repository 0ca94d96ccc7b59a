use chrono::{DateTime, Utc};
use mindbridge_core::{HealthState, JobKind};
use redis::{Client, Commands, Connection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::{BrokerConfig, QueueConfig};
use crate::errors::JobError;

/// JSON envelope pushed onto the broker list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub kind: JobKind,
    pub queue: String,
    pub payload: serde_json::Value,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrokerHealth {
    pub state: HealthState,
    pub queues: BTreeMap<String, i64>,
}

/// Redis-list job broker. Tasks are LPUSHed and claimed from the tail, so
/// each queue behaves as FIFO.
pub struct JobQueue {
    client: Client,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(broker: &BrokerConfig, config: QueueConfig) -> Result<Self, JobError> {
        broker.validate()?;

        let client = Client::open(broker.broker_url.as_str())
            .map_err(|e| JobError::BrokerConfiguration(format!("invalid broker url: {}", e)))?;

        let _conn = client
            .get_connection()
            .map_err(|e| JobError::BrokerConnection(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn queue_key(queue: &str) -> String {
        format!("queue:{}", queue)
    }

    /// Route a task by kind and push it onto its queue. Returns the envelope
    /// as stored.
    pub fn enqueue(&self, kind: JobKind, payload: serde_json::Value) -> Result<Task, JobError> {
        let queue = self.config.queue_for(kind).to_string();
        let task = Task {
            id: Uuid::new_v4(),
            kind,
            queue: queue.clone(),
            payload,
            enqueued_at: Utc::now(),
        };

        let json = serde_json::to_string(&task)
            .map_err(|e| JobError::TaskExecution(format!("failed to serialize task: {}", e)))?;

        let mut conn = self.connection()?;
        conn.lpush::<_, _, ()>(Self::queue_key(&queue), json)
            .map_err(|e| JobError::BrokerConnection(format!("enqueue failed: {}", e)))?;

        tracing::debug!(task_id = %task.id, kind = kind.as_str(), queue = %queue, "task enqueued");
        Ok(task)
    }

    /// Claim the oldest task from a queue, if any.
    pub fn claim(&self, queue: &str) -> Result<Option<Task>, JobError> {
        let mut conn = self.connection()?;
        let raw: Option<String> = conn
            .rpop(Self::queue_key(queue), None)
            .map_err(|e| JobError::BrokerConnection(format!("claim failed: {}", e)))?;

        match raw {
            Some(json) => {
                let task = serde_json::from_str(&json).map_err(|e| {
                    JobError::TaskExecution(format!("malformed task envelope: {}", e))
                })?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    pub fn queue_length(&self, queue: &str) -> Result<i64, JobError> {
        let mut conn = self.connection()?;
        conn.llen(Self::queue_key(queue))
            .map_err(|e| JobError::BrokerConnection(format!("llen failed: {}", e)))
    }

    /// Drop all pending tasks from a queue. Returns the number purged.
    pub fn purge(&self, queue: &str) -> Result<i64, JobError> {
        let mut conn = self.connection()?;
        let key = Self::queue_key(queue);

        let pending: i64 = conn
            .llen(&key)
            .map_err(|e| JobError::BrokerConnection(format!("llen failed: {}", e)))?;
        conn.del::<_, ()>(&key)
            .map_err(|e| JobError::BrokerConnection(format!("purge failed: {}", e)))?;

        tracing::info!(queue, purged = pending, "queue purged");
        Ok(pending)
    }

    pub fn ping(&self) -> Result<bool, JobError> {
        let mut conn = self.connection()?;
        let pong: String = redis::cmd("PING")
            .query(&mut conn)
            .map_err(|e| JobError::BrokerConnection(e.to_string()))?;
        Ok(pong == "PONG")
    }

    /// Broker reachability plus the depth of every routed queue.
    pub fn broker_health(&self) -> BrokerHealth {
        let mut queues = BTreeMap::new();

        let state = match self.ping() {
            Ok(true) => {
                for name in self.config.queue_names() {
                    let length = self.queue_length(name).unwrap_or(-1);
                    queues.insert(name.to_string(), length);
                }
                HealthState::Healthy
            }
            _ => HealthState::Unhealthy,
        };

        BrokerHealth { state, queues }
    }

    fn connection(&self) -> Result<Connection, JobError> {
        self.client
            .get_connection()
            .map_err(|e| JobError::BrokerConnection(e.to_string()))
    }
}
