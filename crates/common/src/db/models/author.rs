//! Author entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(indexed)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::article_author::Entity")]
    ArticleAuthors,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        super::article_author::Relation::Article.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::article_author::Relation::Author.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
