use mindbridge_core::HealthState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vector_store::Repository;

use crate::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthState,
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: HealthState,
    pub checks: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub content: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub document_type: Option<String>,
    pub repository_id: Option<i32>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ids: Vec<i32>,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<i32>,
    pub repository_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i32,
    pub content: String,
    pub title: Option<String>,
    pub document_type: Option<String>,
    pub repository_id: Option<i32>,
    pub file_path: Option<String>,
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
    pub url: String,
    pub branch: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepositoryResponse {
    pub repository: Repository,
    pub job_id: i32,
}

impl IngestRequest {
    /// Rejected before any chunking or embedding work happens.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.content.trim().is_empty() {
            return Err(ApiError::Validation(
                "content must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl SearchRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.query.trim().is_empty() {
            return Err(ApiError::Validation("query must not be empty".to_string()));
        }
        Ok(())
    }

    /// Result window: defaults to 10, never more than 100.
    pub fn effective_limit(&self) -> i32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

impl CreateRepositoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(ApiError::Validation("url must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_search_limit_to_ten() {
        let request = SearchRequest {
            query: "vector search".to_string(),
            limit: None,
            repository_id: None,
        };
        assert_eq!(request.effective_limit(), 10);
    }

    #[test]
    fn should_cap_search_limit_at_one_hundred() {
        let request = SearchRequest {
            query: "vector search".to_string(),
            limit: Some(5000),
            repository_id: None,
        };
        assert_eq!(request.effective_limit(), 100);

        let request = SearchRequest {
            limit: Some(0),
            ..request
        };
        assert_eq!(request.effective_limit(), 1);
    }

    #[test]
    fn should_deserialize_ingest_request_with_optional_fields() {
        let json = r#"{"content": "Some document body"}"#;
        let request: IngestRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.content, "Some document body");
        assert!(request.title.is_none());
        assert!(request.repository_id.is_none());
    }

    #[test]
    fn should_deserialize_search_request() {
        let json = r#"{"query": "onboarding policy", "limit": 5, "repository_id": 3}"#;
        let request: SearchRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.query, "onboarding policy");
        assert_eq!(request.effective_limit(), 5);
        assert_eq!(request.repository_id, Some(3));
    }

    #[test]
    fn should_reject_empty_document_content() {
        let request = IngestRequest {
            content: "   \n\t ".to_string(),
            title: None,
            source_url: None,
            document_type: None,
            repository_id: None,
            file_path: None,
        };

        let err = request.validate().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_reject_empty_search_query() {
        let request = SearchRequest {
            query: "  ".to_string(),
            limit: None,
            repository_id: None,
        };

        let err = request.validate().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);

        let request = SearchRequest {
            query: "retention policy".to_string(),
            limit: None,
            repository_id: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn should_reject_blank_repository_fields() {
        let request = CreateRepositoryRequest {
            name: "".to_string(),
            url: "https://example.com/repo.git".to_string(),
            branch: None,
            description: None,
        };
        assert!(matches!(
            request.validate(),
            Err(ApiError::Validation(_))
        ));

        let request = CreateRepositoryRequest {
            name: "repo".to_string(),
            url: "   ".to_string(),
            branch: None,
            description: None,
        };
        assert!(matches!(
            request.validate(),
            Err(ApiError::Validation(_))
        ));

        let request = CreateRepositoryRequest {
            name: "repo".to_string(),
            url: "https://example.com/repo.git".to_string(),
            branch: None,
            description: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn should_serialize_health_response() {
        let response = HealthResponse {
            status: HealthState::Healthy,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
            version: "0.1.0".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"version\":\"0.1.0\""));
    }

    #[test]
    fn should_serialize_readiness_checks() {
        let mut checks = BTreeMap::new();
        checks.insert("database".to_string(), "healthy".to_string());
        checks.insert("redis".to_string(), "unhealthy".to_string());

        let response = ReadinessResponse {
            status: HealthState::Unhealthy,
            checks,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"database\":\"healthy\""));
        assert!(json.contains("\"redis\":\"unhealthy\""));
        assert!(json.contains("\"status\":\"unhealthy\""));
    }
}
