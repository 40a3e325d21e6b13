use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::algorithm::AlgorithmInput;
pub use repositories::content::ContentInput;
pub use repositories::file::FileRecordInput;
pub use repositories::project::ProjectInput;

use crate::entities::{algorithm_contents, algorithms, projects, uploaded_files};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn algorithm_repo(&self) -> repositories::algorithm::AlgorithmRepository {
        repositories::algorithm::AlgorithmRepository::new(self.conn.clone())
    }

    fn content_repo(&self) -> repositories::content::ContentRepository {
        repositories::content::ContentRepository::new(self.conn.clone())
    }

    fn project_repo(&self) -> repositories::project::ProjectRepository {
        repositories::project::ProjectRepository::new(self.conn.clone())
    }

    fn file_repo(&self) -> repositories::file::FileRepository {
        repositories::file::FileRepository::new(self.conn.clone())
    }

    // ========== Algorithms ==========

    pub async fn create_algorithm(&self, input: &AlgorithmInput) -> Result<algorithms::Model> {
        self.algorithm_repo().create(input).await
    }

    pub async fn get_algorithm(&self, id: i32) -> Result<Option<algorithms::Model>> {
        self.algorithm_repo().get(id).await
    }

    pub async fn list_algorithms(&self, category: Option<&str>) -> Result<Vec<algorithms::Model>> {
        self.algorithm_repo().list(category).await
    }

    pub async fn update_algorithm(
        &self,
        id: i32,
        input: &AlgorithmInput,
    ) -> Result<Option<algorithms::Model>> {
        self.algorithm_repo().update(id, input).await
    }

    pub async fn remove_algorithm(&self, id: i32) -> Result<bool> {
        self.algorithm_repo().remove(id).await
    }

    pub async fn count_algorithms(&self) -> Result<u64> {
        self.algorithm_repo().count().await
    }

    // ========== Algorithm contents ==========

    pub async fn create_content(
        &self,
        algorithm_id: i32,
        input: &ContentInput,
    ) -> Result<algorithm_contents::Model> {
        self.content_repo().create(algorithm_id, input).await
    }

    pub async fn get_content(&self, id: i32) -> Result<Option<algorithm_contents::Model>> {
        self.content_repo().get(id).await
    }

    pub async fn list_contents(&self, algorithm_id: i32) -> Result<Vec<algorithm_contents::Model>> {
        self.content_repo().list_for_algorithm(algorithm_id).await
    }

    pub async fn update_content(
        &self,
        id: i32,
        input: &ContentInput,
    ) -> Result<Option<algorithm_contents::Model>> {
        self.content_repo().update(id, input).await
    }

    pub async fn remove_content(&self, id: i32) -> Result<bool> {
        self.content_repo().remove(id).await
    }

    // ========== Projects ==========

    pub async fn create_project(&self, input: &ProjectInput) -> Result<projects::Model> {
        self.project_repo().create(input).await
    }

    pub async fn get_project(&self, id: i32) -> Result<Option<projects::Model>> {
        self.project_repo().get(id).await
    }

    pub async fn list_projects(&self) -> Result<Vec<projects::Model>> {
        self.project_repo().list().await
    }

    pub async fn update_project(
        &self,
        id: i32,
        input: &ProjectInput,
    ) -> Result<Option<projects::Model>> {
        self.project_repo().update(id, input).await
    }

    pub async fn remove_project(&self, id: i32) -> Result<bool> {
        self.project_repo().remove(id).await
    }

    pub async fn count_projects(&self) -> Result<u64> {
        self.project_repo().count().await
    }

    // ========== Uploaded files ==========

    pub async fn insert_file(&self, input: &FileRecordInput) -> Result<uploaded_files::Model> {
        self.file_repo().insert(input).await
    }

    pub async fn get_file(&self, id: i32) -> Result<Option<uploaded_files::Model>> {
        self.file_repo().get(id).await
    }

    pub async fn list_files_for_algorithm(
        &self,
        algorithm_id: i32,
    ) -> Result<Vec<uploaded_files::Model>> {
        self.file_repo().list_for_algorithm(algorithm_id).await
    }

    pub async fn list_files_for_project(
        &self,
        project_id: i32,
    ) -> Result<Vec<uploaded_files::Model>> {
        self.file_repo().list_for_project(project_id).await
    }

    pub async fn remove_file(&self, id: i32) -> Result<bool> {
        self.file_repo().remove(id).await
    }
}
