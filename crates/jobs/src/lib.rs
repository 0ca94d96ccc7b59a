pub mod config;
pub mod errors;
pub mod queue;

pub use config::{BrokerConfig, QueueConfig, ScheduledTask};
pub use errors::JobError;
pub use queue::{BrokerHealth, JobQueue, Task};
