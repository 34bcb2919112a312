use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    entities::{gallery, image},
    services::{
        luminance::Tone,
        utils::{decode_entities, format_timestamp},
    },
};

/// 相册信息
///
/// 名称和描述已还原 HTML 实体，日期为 `dd.mm.YYYY HH:MM`（UTC）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryResponse {
    #[schema(example = 1)]
    pub id: i32,
    /// 作者用户 ID
    #[schema(example = 7)]
    pub author: i32,
    /// 是否公开
    pub status: bool,
    #[schema(example = "Sommer 2017")]
    pub name: String,
    pub description: String,
    #[schema(example = "14.07.2017 02:40")]
    pub creation_date: String,
    #[schema(example = "14.07.2017 02:40")]
    pub modified_date: String,
    #[schema(example = "/data/media/gallery/7/1/teaserImage.png")]
    pub teaser_image: String,
    pub teaser_image_thumbnail1: String,
    pub teaser_image_thumbnail2: String,
    pub teaser_image_thumbnail3: String,
}

impl From<gallery::Model> for GalleryResponse {
    fn from(model: gallery::Model) -> Self {
        Self {
            id: model.id,
            author: model.author,
            status: model.status,
            name: decode_entities(&model.name),
            description: decode_entities(&model.description),
            creation_date: format_timestamp(model.creation_date),
            modified_date: format_timestamp(model.modified_date),
            teaser_image: model.teaser_image,
            teaser_image_thumbnail1: model.teaser_image_thumbnail1,
            teaser_image_thumbnail2: model.teaser_image_thumbnail2,
            teaser_image_thumbnail3: model.teaser_image_thumbnail3,
        }
    }
}

/// 相册图片
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: i32,
    pub gallery_id: i32,
    pub image_path: String,
    pub thumbnail_path: Option<String>,
    pub thumbnail_path2: Option<String>,
    pub thumbnail_path3: Option<String>,
}

impl From<image::Model> for ImageResponse {
    fn from(model: image::Model) -> Self {
        Self {
            id: model.id,
            gallery_id: model.gallery_id,
            image_path: model.image_path,
            thumbnail_path: model.thumbnail_path,
            thumbnail_path2: model.thumbnail_path2,
            thumbnail_path3: model.thumbnail_path3,
        }
    }
}

/// 所有相册 ID
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GalleryIdsResponse {
    #[schema(example = json!([1, 2, 5]))]
    pub ids: Vec<i32>,
}

/// 创建相册（multipart/form-data）
#[derive(Debug, TryFromMultipart, Validate, ToSchema)]
pub struct CreateGalleryRequest {
    /// 是否公开
    pub status: bool,
    /// 相册名称
    #[validate(length(min = 1, max = 255, message = "相册名称长度限制为 1~255"))]
    pub name: String,
    /// 相册描述
    #[validate(length(max = 65535, message = "相册描述过长"))]
    pub description: String,
    /// 创建时间（Unix 时间戳），缺省为当前时间
    pub creation_date: Option<i64>,
    /// 修改时间（Unix 时间戳），缺省为当前时间
    pub modified_date: Option<i64>,
    /// 封面图片（jpeg/png）
    #[form_data(limit = "unlimited")]
    #[schema(value_type = String, format = Binary)]
    pub image: FieldData<Bytes>,
}

/// 编辑相册
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EditGalleryRequest {
    pub status: bool,
    #[validate(length(min = 1, max = 255, message = "相册名称长度限制为 1~255"))]
    pub name: String,
    #[validate(length(max = 65535, message = "相册描述过长"))]
    pub description: String,
    /// 修改时间（Unix 时间戳），缺省为当前时间
    #[serde(default)]
    pub modified_date: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct OwnershipQuery {
    /// 无权限时跳转的地址
    #[schema(example = "/login")]
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OwnershipResponse {
    pub owned: bool,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LuminanceQuery {
    /// 每个方向的采样次数
    #[schema(example = 10, default = 10)]
    pub samples: Option<u32>,
    /// 使用旧版除数（采样次数 + 1）
    #[serde(default)]
    pub legacy: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LuminanceResponse {
    #[schema(example = 142.3)]
    pub luminance: f64,
    pub tone: Tone,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    #[schema(example = 3)]
    pub deleted: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    #[schema(example = "成功删除相册")]
    pub message: String,
}
