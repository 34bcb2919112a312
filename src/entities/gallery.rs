use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gallery")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub author: i32,
    pub status: bool,
    /// HTML 实体编码后的名称
    pub name: String,
    /// HTML 实体编码后的描述
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Unix 时间戳（秒）
    #[sea_orm(column_name = "creationDate")]
    pub creation_date: i64,
    /// Unix 时间戳（秒）
    #[sea_orm(column_name = "modifiedDate")]
    pub modified_date: i64,
    #[sea_orm(column_name = "teaserImage")]
    pub teaser_image: String,
    #[sea_orm(column_name = "teaserImageThumbnail1")]
    pub teaser_image_thumbnail1: String,
    #[sea_orm(column_name = "teaserImageThumbnail2")]
    pub teaser_image_thumbnail2: String,
    #[sea_orm(column_name = "teaserImageThumbnail3")]
    pub teaser_image_thumbnail3: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::image::Entity")]
    Images,
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
