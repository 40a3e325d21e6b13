use sea_orm::entity::prelude::*;

/// A note attached to an algorithm write-up (proof sketch, complexity
/// analysis, alternative implementation, ...).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "algorithm_contents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub algorithm_id: i32,

    pub title: String,

    pub body: String,

    pub sort_index: i32,

    pub created_at: String,

    pub updated_at: String,
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
}

impl Related<super::algorithms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Algorithms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
