use std::time::Duration;

use anyhow::{Context, Result};
use mindbridge_core::config::DatabaseConfig;
use mindbridge_core::{JobKind, JobStatus, RepositoryStatus};
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::models::{
    Job, NewRepository, NewVectorDocument, Repository, SearchResult, VectorDocument,
};

/// Results below this similarity carry no signal and are dropped.
const MIN_SIMILARITY: f64 = 0.01;

pub struct VectorStore {
    pool: PgPool,
    embedding_dimensions: usize,
}

impl VectorStore {
    /// Connect with pool tuning from configuration and apply migrations.
    pub async fn connect(config: &DatabaseConfig, embedding_dimensions: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        db_migrations::run_migrations(&config.url)
            .await
            .context("Failed to run database migrations")?;

        tracing::info!(
            embedding_dimensions,
            "Vector store initialized with migrations applied"
        );

        Ok(Self {
            pool,
            embedding_dimensions,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn validate_dimensions(&self, embedding: &[f32], what: &str) -> Result<()> {
        if embedding.len() != self.embedding_dimensions {
            return Err(anyhow::anyhow!(
                "{} dimension mismatch: expected {}, got {}",
                what,
                self.embedding_dimensions,
                embedding.len()
            ));
        }
        Ok(())
    }

    pub async fn insert_document(&self, doc: NewVectorDocument) -> Result<VectorDocument> {
        self.validate_dimensions(&doc.embedding, "Embedding")?;

        let embedding_vector = Vector::from(doc.embedding.clone());

        let row = sqlx::query(
            r#"
            INSERT INTO vector_documents
                (content, title, source_url, embedding, document_type,
                 repository_id, document_id, file_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(&doc.content)
        .bind(&doc.title)
        .bind(&doc.source_url)
        .bind(embedding_vector)
        .bind(&doc.document_type)
        .bind(doc.repository_id)
        .bind(doc.document_id)
        .bind(&doc.file_path)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert vector document")?;

        Ok(VectorDocument {
            id: row.get("id"),
            content: doc.content,
            title: doc.title,
            source_url: doc.source_url,
            embedding: doc.embedding,
            document_type: doc.document_type,
            repository_id: doc.repository_id,
            document_id: doc.document_id,
            file_path: doc.file_path,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    pub async fn search_similar(
        &self,
        query_embedding: Vec<f32>,
        limit: i32,
    ) -> Result<Vec<SearchResult>> {
        self.search_scoped(query_embedding, limit, None).await
    }

    /// Similarity search restricted to one repository's documents.
    pub async fn search_by_repository(
        &self,
        repository_id: i32,
        query_embedding: Vec<f32>,
        limit: i32,
    ) -> Result<Vec<SearchResult>> {
        self.search_scoped(query_embedding, limit, Some(repository_id))
            .await
    }

    async fn search_scoped(
        &self,
        query_embedding: Vec<f32>,
        limit: i32,
        repository_id: Option<i32>,
    ) -> Result<Vec<SearchResult>> {
        self.validate_dimensions(&query_embedding, "Query embedding")?;

        let query_vector = Vector::from(query_embedding);

        let rows = sqlx::query(
            r#"
            WITH similarity_search AS (
                SELECT
                    id,
                    content,
                    title,
                    source_url,
                    embedding,
                    document_type,
                    repository_id,
                    document_id,
                    file_path,
                    created_at,
                    updated_at,
                    1 - (embedding <=> $1) AS similarity
                FROM vector_documents
                WHERE 1 - (embedding <=> $1) > $3
                  AND ($4::integer IS NULL OR repository_id = $4)
                ORDER BY embedding <=> $1
                LIMIT $2
            )
            SELECT * FROM similarity_search
            "#,
        )
        .bind(query_vector)
        .bind(limit)
        .bind(MIN_SIMILARITY)
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to execute similarity search")?;

        tracing::debug!(results = rows.len(), "similarity search completed");

        let results = rows
            .iter()
            .map(|row| {
                let embedding_vector: Vector = row.get("embedding");
                let embedding: Vec<f32> = embedding_vector.into();
                let similarity: f64 = row.get("similarity");

                let document = VectorDocument {
                    id: row.get("id"),
                    content: row.get("content"),
                    title: row.get("title"),
                    source_url: row.get("source_url"),
                    embedding,
                    document_type: row.get("document_type"),
                    repository_id: row.get("repository_id"),
                    document_id: row.get("document_id"),
                    file_path: row.get("file_path"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                };

                SearchResult::new(document, similarity as f32)
            })
            .collect();

        Ok(results)
    }

    pub async fn document_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM vector_documents")
            .fetch_one(&self.pool)
            .await
            .context("Failed to get document count")?;

        Ok(row.get("count"))
    }

    /// Remove every vector document belonging to a repository. Returns the
    /// number of rows deleted.
    pub async fn delete_by_repository(&self, repository_id: i32) -> Result<u64> {
        let result = sqlx::query("DELETE FROM vector_documents WHERE repository_id = $1")
            .bind(repository_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete repository documents")?;

        Ok(result.rows_affected())
    }

    pub async fn create_repository(&self, repo: &NewRepository) -> Result<Repository> {
        let row = sqlx::query(
            r#"
            INSERT INTO repositories (name, url, branch, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, status::text AS status, created_at, updated_at
            "#,
        )
        .bind(&repo.name)
        .bind(&repo.url)
        .bind(repo.branch_or_default())
        .bind(&repo.description)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create repository")?;

        let status: String = row.get("status");
        Ok(Repository {
            id: row.get("id"),
            name: repo.name.clone(),
            url: repo.url.clone(),
            description: repo.description.clone(),
            branch: repo.branch_or_default().to_string(),
            status: RepositoryStatus::parse(&status)
                .context("Unknown repository status in database")?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    pub async fn get_repository(&self, id: i32) -> Result<Option<Repository>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, url, description, branch, status::text AS status,
                   created_at, updated_at
            FROM repositories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch repository")?;

        row.map(|row| Self::repository_from_row(&row)).transpose()
    }

    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, url, description, branch, status::text AS status,
                   created_at, updated_at
            FROM repositories
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list repositories")?;

        rows.iter().map(Self::repository_from_row).collect()
    }

    pub async fn set_repository_status(
        &self,
        id: i32,
        status: RepositoryStatus,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE repositories SET status = $2::repositorystatus, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .context("Failed to update repository status")?;

        Ok(())
    }

    pub async fn create_job(
        &self,
        repository_id: i32,
        job_type: JobKind,
        params: Option<serde_json::Value>,
    ) -> Result<Job> {
        let row = sqlx::query(
            r#"
            INSERT INTO jobs (job_type, repository_id, params)
            VALUES ($1::jobtype, $2, $3)
            RETURNING id, status::text AS status, created_at, updated_at
            "#,
        )
        .bind(job_type.as_str())
        .bind(repository_id)
        .bind(&params)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create job")?;

        let status: String = row.get("status");
        Ok(Job {
            id: row.get("id"),
            job_type,
            status: JobStatus::parse(&status).context("Unknown job status in database")?,
            params,
            result: None,
            error_message: None,
            repository_id,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            started_at: None,
            completed_at: None,
        })
    }

    /// Transition a job. Moving to running stamps started_at; reaching a
    /// terminal state stamps completed_at.
    pub async fn update_job_status(
        &self,
        job_id: i32,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<Job> {
        let row = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2::jobstatus,
                updated_at = now(),
                error_message = COALESCE($3, error_message),
                started_at = CASE
                    WHEN $2 = 'running' AND started_at IS NULL THEN now()
                    ELSE started_at
                END,
                completed_at = CASE
                    WHEN $2 IN ('completed', 'failed', 'cancelled') THEN now()
                    ELSE completed_at
                END
            WHERE id = $1
            RETURNING id, job_type::text AS job_type, status::text AS status,
                      params, result, error_message, repository_id,
                      created_at, updated_at, started_at, completed_at
            "#,
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(error_message)
        .fetch_one(&self.pool)
        .await
        .context("Failed to update job status")?;

        Self::job_from_row(&row)
    }

    pub async fn get_job(&self, job_id: i32) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            SELECT id, job_type::text AS job_type, status::text AS status,
                   params, result, error_message, repository_id,
                   created_at, updated_at, started_at, completed_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch job")?;

        row.map(|row| Self::job_from_row(&row)).transpose()
    }

    fn repository_from_row(row: &sqlx::postgres::PgRow) -> Result<Repository> {
        let status: String = row.get("status");
        Ok(Repository {
            id: row.get("id"),
            name: row.get("name"),
            url: row.get("url"),
            description: row.get("description"),
            branch: row.get("branch"),
            status: RepositoryStatus::parse(&status)
                .context("Unknown repository status in database")?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn job_from_row(row: &sqlx::postgres::PgRow) -> Result<Job> {
        let job_type: String = row.get("job_type");
        let status: String = row.get("status");
        Ok(Job {
            id: row.get("id"),
            job_type: JobKind::parse(&job_type).context("Unknown job type in database")?,
            status: JobStatus::parse(&status).context("Unknown job status in database")?,
            params: row.get("params"),
            result: row.get("result"),
            error_message: row.get("error_message"),
            repository_id: row.get("repository_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        })
    }
}
