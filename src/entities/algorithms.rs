use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "algorithms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    /// Broad grouping shown in the catalogue, e.g. "graph", "dp", "greedy".
    pub category: String,

    pub difficulty: Option<String>,

    pub summary: Option<String>,

    /// Markdown body of the write-up.
    pub body: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::algorithm_contents::Entity")]
    AlgorithmContents,
    #[sea_orm(has_many = "super::uploaded_files::Entity")]
    UploadedFiles,
}

impl Related<super::algorithm_contents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlgorithmContents.def()
    }
}

impl Related<super::uploaded_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UploadedFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
