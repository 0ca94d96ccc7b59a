use chrono::{DateTime, Utc};
use mindbridge_core::{JobKind, JobStatus, RepositoryStatus};
use serde::{Deserialize, Serialize};

/// A stored embedding row from the vector_documents table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: i32,
    pub content: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip_serializing, default)]
    pub embedding: Vec<f32>,
    pub document_type: Option<String>,
    pub repository_id: Option<i32>,
    pub document_id: Option<i32>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a vector document. The id and timestamps are assigned
/// by the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVectorDocument {
    pub content: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub embedding: Vec<f32>,
    pub document_type: Option<String>,
    pub repository_id: Option<i32>,
    pub document_id: Option<i32>,
    pub file_path: Option<String>,
}

impl NewVectorDocument {
    pub fn new(content: String, embedding: Vec<f32>) -> Self {
        Self {
            content,
            title: None,
            source_url: None,
            embedding,
            document_type: None,
            repository_id: None,
            document_id: None,
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub branch: String,
    pub status: RepositoryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepository {
    pub name: String,
    pub url: String,
    pub branch: Option<String>,
    pub description: Option<String>,
}

impl NewRepository {
    pub fn branch_or_default(&self) -> &str {
        self.branch.as_deref().unwrap_or("main")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i32,
    pub job_type: JobKind,
    pub status: JobStatus,
    pub params: Option<serde_json::Value>,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub repository_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: VectorDocument,
    pub similarity: f32,
}

impl SearchResult {
    pub fn new(document: VectorDocument, similarity: f32) -> Self {
        Self {
            document,
            similarity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_optional_fields_on_new_vector_document() {
        let doc = NewVectorDocument::new("some content".to_string(), vec![0.1, 0.2]);

        assert_eq!(doc.content, "some content");
        assert_eq!(doc.embedding, vec![0.1, 0.2]);
        assert!(doc.title.is_none());
        assert!(doc.repository_id.is_none());
        assert!(doc.file_path.is_none());
    }

    #[test]
    fn should_default_repository_branch_to_main() {
        let repo = NewRepository {
            name: "mindbridge".to_string(),
            url: "https://example.com/mindbridge.git".to_string(),
            branch: None,
            description: None,
        };
        assert_eq!(repo.branch_or_default(), "main");

        let repo = NewRepository {
            branch: Some("develop".to_string()),
            ..repo
        };
        assert_eq!(repo.branch_or_default(), "develop");
    }

    #[test]
    fn should_not_serialize_raw_embedding() {
        let doc = VectorDocument {
            id: 1,
            content: "text".to_string(),
            title: Some("title".to_string()),
            source_url: None,
            embedding: vec![0.5; 4],
            document_type: None,
            repository_id: None,
            document_id: None,
            file_path: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("embedding"));
        assert!(json.contains("\"content\":\"text\""));
    }

    #[test]
    fn should_create_search_result_with_similarity() {
        let doc = VectorDocument {
            id: 7,
            content: "text".to_string(),
            title: None,
            source_url: None,
            embedding: vec![0.1; 3],
            document_type: None,
            repository_id: Some(2),
            document_id: None,
            file_path: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let result = SearchResult::new(doc.clone(), 0.93);
        assert_eq!(result.similarity, 0.93);
        assert_eq!(result.document.id, doc.id);
    }
}
