use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::algorithm_contents;

#[derive(Debug, Clone)]
pub struct ContentInput {
    pub title: String,
    pub body: String,
    pub sort_index: i32,
}

pub struct ContentRepository {
    conn: DatabaseConnection,
}

impl ContentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        algorithm_id: i32,
        input: &ContentInput,
    ) -> Result<algorithm_contents::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = algorithm_contents::ActiveModel {
            algorithm_id: Set(algorithm_id),
            title: Set(input.title.clone()),
            body: Set(input.body.clone()),
            sort_index: Set(input.sort_index),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert algorithm content")
    }

    pub async fn get(&self, id: i32) -> Result<Option<algorithm_contents::Model>> {
        algorithm_contents::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query algorithm content")
    }

    pub async fn list_for_algorithm(
        &self,
        algorithm_id: i32,
    ) -> Result<Vec<algorithm_contents::Model>> {
        algorithm_contents::Entity::find()
            .filter(algorithm_contents::Column::AlgorithmId.eq(algorithm_id))
            .order_by_asc(algorithm_contents::Column::SortIndex)
            .all(&self.conn)
            .await
            .context("Failed to list algorithm contents")
    }

    pub async fn update(
        &self,
        id: i32,
        input: &ContentInput,
    ) -> Result<Option<algorithm_contents::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: algorithm_contents::ActiveModel = existing.into();
        active.title = Set(input.title.clone());
        active.body = Set(input.body.clone());
        active.sort_index = Set(input.sort_index);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update algorithm content")?;

        Ok(Some(model))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = algorithm_contents::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete algorithm content")?;

        Ok(result.rows_affected > 0)
    }
}
