use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 相册图片，由图片模块负责写入，这里只读
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "galleryId", indexed)]
    pub gallery_id: i32,
    #[sea_orm(column_name = "imagePath")]
    pub image_path: String,
    #[sea_orm(column_name = "thumbnailPath", nullable)]
    pub thumbnail_path: Option<String>,
    #[sea_orm(column_name = "thumbnailPath2", nullable)]
    pub thumbnail_path2: Option<String>,
    #[sea_orm(column_name = "thumbnailPath3", nullable)]
    pub thumbnail_path3: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gallery::Entity",
        from = "Column::GalleryId",
        to = "super::gallery::Column::Id",
        on_delete = "Cascade"
    )]
    Gallery,
}

impl Related<super::gallery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Gallery.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
