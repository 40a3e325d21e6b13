use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "uploaded_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// On-disk name inside the uploads directory (uuid + original extension).
    /// Never derived from client input.
    #[sea_orm(unique)]
    pub storage_name: String,

    pub original_name: String,

    /// Content type recorded at upload time; served back verbatim.
    pub mime_type: String,

    pub size_bytes: i64,

    /// At most one owner; both unset for unattached uploads.
    pub algorithm_id: Option<i32>,

    pub project_id: Option<i32>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::algorithms::Entity",
        from = "Column::AlgorithmId",
        to = "super::algorithms::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Algorithms,
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Projects,
}

impl Related<super::algorithms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Algorithms.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
