use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
}

fn default_pool_size() -> u32 {
    10
}

fn default_max_overflow() -> u32 {
    20
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_max_lifetime_secs() -> u64 {
    3600
}

impl DatabaseConfig {
    pub fn with_env_overrides(&self) -> Self {
        let url = env::var("DATABASE_URL").unwrap_or_else(|_| self.url.clone());
        Self {
            url,
            ..self.clone()
        }
    }

    /// Upper bound on open connections, pool plus overflow.
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    3600
}

impl RedisConfig {
    pub fn with_env_overrides(&self) -> Self {
        let url = env::var("REDIS_URL").unwrap_or_else(|_| self.url.clone());
        Self {
            url,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub dimension: Option<usize>,
}

impl EmbeddingConfig {
    pub fn with_env_overrides(&self) -> Self {
        let model = env::var("EMBEDDING_MODEL").ok().or_else(|| self.model.clone());
        let dimension = env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(self.dimension);
        Self {
            provider: self.provider.clone(),
            model,
            endpoint: self.endpoint.clone(),
            dimension,
        }
    }

    /// Dimension the vector schema enforces when none is configured.
    pub fn dimension_or_default(&self) -> usize {
        self.dimension.unwrap_or(1536)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub broker_url: Option<String>,
    pub visibility_timeout_secs: u64,
    pub soft_time_limit_secs: u64,
    pub time_limit_secs: u64,
    pub prefetch_multiplier: u32,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            broker_url: None,
            visibility_timeout_secs: 3600,
            soft_time_limit_secs: 300,
            time_limit_secs: 600,
            prefetch_multiplier: 4,
        }
    }
}

impl JobsConfig {
    pub fn with_env_overrides(&self) -> Self {
        let broker_url = env::var("JOB_BROKER_URL").ok().or_else(|| self.broker_url.clone());
        Self {
            broker_url,
            ..self.clone()
        }
    }

    /// Broker URL, falling back to the shared Redis URL.
    pub fn broker_url_or<'a>(&'a self, redis_url: &'a str) -> &'a str {
        self.broker_url.as_deref().unwrap_or(redis_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl ServerConfig {
    pub fn with_env_overrides(&self) -> Self {
        let allowed_origins = match env::var("ALLOWED_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => self.allowed_origins.clone(),
        };
        Self {
            bind: self.bind.clone(),
            allowed_origins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "console".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_env_overrides(&self) -> Self {
        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| self.level.clone());
        let format = env::var("LOG_FORMAT").unwrap_or_else(|_| self.format.clone());
        Self { level, format }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config.with_env_overrides())
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| Self::default_config_path());
        Self::load(Path::new(&config_path))
    }

    pub fn default_config_path() -> String {
        "./config.toml".to_string()
    }

    pub fn with_env_overrides(&self) -> Self {
        Self {
            database: self.database.with_env_overrides(),
            redis: self.redis.with_env_overrides(),
            embedding: self.embedding.with_env_overrides(),
            jobs: self.jobs.with_env_overrides(),
            server: self.server.with_env_overrides(),
            logging: self.logging.with_env_overrides(),
        }
    }

    /// Startup-time validation. An empty origin list is refused outright so
    /// the service never comes up with an open CORS policy by accident.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("database url must not be empty");
        }
        if self.redis.url.is_empty() {
            anyhow::bail!("redis url must not be empty");
        }
        if self.server.allowed_origins.is_empty() {
            anyhow::bail!("allowed_origins must be set (or ALLOWED_ORIGINS exported)");
        }
        Ok(())
    }
}
