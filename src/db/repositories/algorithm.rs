use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::entities::algorithms;

/// Fields accepted when creating or updating an algorithm write-up.
#[derive(Debug, Clone)]
pub struct AlgorithmInput {
    pub title: String,
    pub category: String,
    pub difficulty: Option<String>,
    pub summary: Option<String>,
    pub body: String,
}

pub struct AlgorithmRepository {
    conn: DatabaseConnection,
}

impl AlgorithmRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: &AlgorithmInput) -> Result<algorithms::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = algorithms::ActiveModel {
            title: Set(input.title.clone()),
            category: Set(input.category.clone()),
            difficulty: Set(input.difficulty.clone()),
            summary: Set(input.summary.clone()),
            body: Set(input.body.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert algorithm")?;

        info!(id = model.id, title = %model.title, "Added algorithm");
        Ok(model)
    }

    pub async fn get(&self, id: i32) -> Result<Option<algorithms::Model>> {
        algorithms::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query algorithm")
    }

    pub async fn list(&self, category: Option<&str>) -> Result<Vec<algorithms::Model>> {
        let mut query = algorithms::Entity::find().order_by_asc(algorithms::Column::Title);

        if let Some(category) = category {
            query = query.filter(algorithms::Column::Category.eq(category));
        }

        query.all(&self.conn).await.context("Failed to list algorithms")
    }

    pub async fn update(&self, id: i32, input: &AlgorithmInput) -> Result<Option<algorithms::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: algorithms::ActiveModel = existing.into();
        active.title = Set(input.title.clone());
        active.category = Set(input.category.clone());
        active.difficulty = Set(input.difficulty.clone());
        active.summary = Set(input.summary.clone());
        active.body = Set(input.body.clone());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update algorithm")?;

        Ok(Some(model))
    }

    /// Removes the row; attached contents and file rows go with it via the
    /// FK cascade. File bytes are the gateway's job, cleaned up by the caller
    /// before this runs.
    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = algorithms::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete algorithm")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        algorithms::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count algorithms")
    }
}
