use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mindbridge_core::HealthState;
use serde::Serialize;
use sqlx::{PgPool, Row};

/// One labelled health probe outcome.
#[derive(Debug, Clone, Serialize)]
pub struct CheckEntry {
    pub state: HealthState,
    pub message: String,
}

impl CheckEntry {
    fn healthy(message: impl Into<String>) -> Self {
        Self {
            state: HealthState::Healthy,
            message: message.into(),
        }
    }

    fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            state: HealthState::Unhealthy,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub state: HealthState,
    pub timestamp: DateTime<Utc>,
    pub checks: BTreeMap<String, CheckEntry>,
}

impl HealthReport {
    fn new() -> Self {
        Self {
            state: HealthState::Healthy,
            timestamp: Utc::now(),
            checks: BTreeMap::new(),
        }
    }

    fn push(&mut self, name: &str, entry: CheckEntry) {
        self.state = self.state.merge(entry.state);
        self.checks.insert(name.to_string(), entry);
    }

    fn absorb(&mut self, other: HealthReport) {
        self.state = self.state.merge(other.state);
        self.checks.extend(other.checks);
    }
}

/// Probes connectivity, the pgvector extension and pool saturation.
pub struct DatabaseHealthChecker {
    pool: PgPool,
}

impl DatabaseHealthChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn check_connectivity(&self) -> HealthReport {
        let mut report = HealthReport::new();

        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => report.push(
                "connectivity",
                CheckEntry::healthy("Database connection successful"),
            ),
            Err(e) => report.push(
                "connectivity",
                CheckEntry::unhealthy(format!("Database connection failed: {}", e)),
            ),
        }

        report
    }

    pub async fn check_pgvector(&self) -> HealthReport {
        let mut report = HealthReport::new();

        let extension = sqlx::query(
            "SELECT extname, extversion FROM pg_extension WHERE extname = 'vector'",
        )
        .fetch_optional(&self.pool)
        .await;

        match extension {
            Ok(Some(row)) => {
                let version: String = row.get("extversion");
                report.push(
                    "pgvector_extension",
                    CheckEntry::healthy(format!(
                        "pgvector extension version {} is installed",
                        version
                    )),
                );

                // Distance over literal vectors exercises the operator path
                let probe =
                    sqlx::query("SELECT '[1,2,3]'::vector <-> '[4,5,6]'::vector AS distance")
                        .fetch_one(&self.pool)
                        .await;

                match probe {
                    Ok(row) => {
                        let distance: f64 = row.get("distance");
                        report.push(
                            "vector_operations",
                            CheckEntry::healthy(format!(
                                "Vector distance calculation successful: {}",
                                distance
                            )),
                        );
                    }
                    Err(e) => report.push(
                        "vector_operations",
                        CheckEntry::unhealthy(format!("Vector operation failed: {}", e)),
                    ),
                }
            }
            Ok(None) => report.push(
                "pgvector_extension",
                CheckEntry::unhealthy("pgvector extension is not installed"),
            ),
            Err(e) => report.push(
                "pgvector_extension",
                CheckEntry::unhealthy(format!("pgvector check failed: {}", e)),
            ),
        }

        report
    }

    pub async fn check_pool(&self) -> HealthReport {
        let mut report = HealthReport::new();

        let size = self.pool.size();
        let idle = self.pool.num_idle();
        let in_use = size as usize - idle.min(size as usize);

        report.push(
            "connection_pool",
            CheckEntry::healthy(format!(
                "pool size {}, idle {}, in use {}",
                size, idle, in_use
            )),
        );

        report
    }

    /// All probes merged; unhealthy if any single probe is.
    pub async fn comprehensive(&self) -> HealthReport {
        let mut report = self.check_connectivity().await;
        report.absorb(self.check_pgvector().await);
        report.absorb(self.check_pool().await);
        report.timestamp = Utc::now();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_merge_reports_keeping_worst_state() {
        let mut report = HealthReport::new();
        report.push("first", CheckEntry::healthy("fine"));
        assert_eq!(report.state, HealthState::Healthy);

        let mut other = HealthReport::new();
        other.push("second", CheckEntry::unhealthy("broken"));

        report.absorb(other);
        assert_eq!(report.state, HealthState::Unhealthy);
        assert_eq!(report.checks.len(), 2);
    }

    #[test]
    fn should_serialize_report_with_lowercase_states() {
        let mut report = HealthReport::new();
        report.push("connectivity", CheckEntry::healthy("ok"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"state\":\"healthy\""));
        assert!(json.contains("\"connectivity\""));
    }

    #[test]
    fn should_keep_entry_messages() {
        let entry = CheckEntry::unhealthy("pgvector extension is not installed");
        assert_eq!(entry.state, HealthState::Unhealthy);
        assert!(entry.message.contains("pgvector"));
    }
}
