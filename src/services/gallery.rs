use sea_orm::*;

use crate::{
    entities::{gallery, image, GalleryEntity, ImageEntity},
    errors::{ApiError, ApiResult},
    schemas::gallery::{GalleryResponse, ImageResponse},
    services::{
        database::DatabaseConnection,
        luminance::{average_luminance, SampleDivisor},
        thumbnail::{check_image, TeaserStorage},
        users::UserService,
        utils::encode_entities,
    },
};

/// 新建相册所需的数据
#[derive(Debug, Clone)]
pub struct NewGallery {
    pub author: i32,
    pub status: bool,
    pub name: String,
    pub description: String,
    pub creation_date: i64,
    pub modified_date: i64,
    /// 上传的封面图片原始内容
    pub image: Vec<u8>,
}

/// 编辑相册，字段会被无条件覆盖
#[derive(Debug, Clone)]
pub struct GalleryEdit {
    pub id: i32,
    pub status: bool,
    pub name: String,
    pub description: String,
    pub modified_date: i64,
}

/// `name` 列为 VARCHAR(255)
pub const NAME_MAX_CHARS: usize = 255;
/// `description` 列为 TEXT
pub const DESCRIPTION_MAX_BYTES: usize = 65_535;

/// 实体编码后再检查长度，编码可能使文本变长数倍
fn encode_text_fields(name: &str, description: &str) -> ApiResult<(String, String)> {
    let name = encode_entities(name);
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "相册名称编码后超过 {NAME_MAX_CHARS} 个字符"
        )));
    }

    let description = encode_entities(description);
    if description.len() > DESCRIPTION_MAX_BYTES {
        return Err(ApiError::Validation(format!(
            "相册描述编码后超过 {DESCRIPTION_MAX_BYTES} 字节"
        )));
    }

    Ok((name, description))
}

pub struct GalleryService;

impl GalleryService {
    /// 所有相册，按创建时间倒序
    pub async fn get_all(db: &DatabaseConnection) -> ApiResult<Vec<GalleryResponse>> {
        let galleries = GalleryEntity::find()
            .order_by_desc(gallery::Column::CreationDate)
            .order_by_desc(gallery::Column::Id)
            .all(db.as_ref())
            .await?;

        tracing::debug!("查询所有相册: count={}", galleries.len());
        Ok(galleries.into_iter().map(Into::into).collect())
    }

    /// 某个作者的所有相册，按创建时间倒序
    pub async fn get_all_by_author(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> ApiResult<Vec<GalleryResponse>> {
        let galleries = GalleryEntity::find()
            .filter(gallery::Column::Author.eq(user_id))
            .order_by_desc(gallery::Column::CreationDate)
            .order_by_desc(gallery::Column::Id)
            .all(db.as_ref())
            .await?;

        tracing::debug!(
            "查询作者相册: user_id={}, count={}",
            user_id,
            galleries.len()
        );
        Ok(galleries.into_iter().map(Into::into).collect())
    }

    /// 所有相册 ID
    pub async fn get_available_galleries(db: &DatabaseConnection) -> ApiResult<Vec<i32>> {
        let ids: Vec<i32> = GalleryEntity::find()
            .select_only()
            .column(gallery::Column::Id)
            .order_by_asc(gallery::Column::Id)
            .into_tuple()
            .all(db.as_ref())
            .await?;

        Ok(ids)
    }

    pub async fn get_gallery_by_id(db: &DatabaseConnection, id: i32) -> ApiResult<GalleryResponse> {
        Ok(Self::find_gallery(db, id).await?.into())
    }

    /// 创建相册
    ///
    /// 先校验图片并在暂存目录生成封面，再在事务中插入记录、写入路径，
    /// 暂存目录改名为正式目录后提交。任一步失败都会回滚并清理文件。
    pub async fn create_gallery(
        db: &DatabaseConnection,
        storage: &TeaserStorage,
        max_upload_bytes: usize,
        data: NewGallery,
    ) -> ApiResult<GalleryResponse> {
        let NewGallery {
            author,
            status,
            name,
            description,
            creation_date,
            modified_date,
            image,
        } = data;
        let (name, description) = encode_text_fields(&name, &description)?;

        let stage_storage = storage.clone();
        let staged = tokio::task::spawn_blocking(move || {
            let validated = check_image(&image, max_upload_bytes)?;
            stage_storage.stage(author, &validated)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("图片处理任务失败: {e}")))??;

        let txn = db.begin().await?;

        let inserted = gallery::ActiveModel {
            author: Set(author),
            status: Set(status),
            name: Set(name),
            description: Set(description),
            creation_date: Set(creation_date),
            modified_date: Set(modified_date),
            teaser_image: Set(String::new()),
            teaser_image_thumbnail1: Set(String::new()),
            teaser_image_thumbnail2: Set(String::new()),
            teaser_image_thumbnail3: Set(String::new()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let paths = staged.paths_for(inserted.id);
        let mut active: gallery::ActiveModel = inserted.into();
        active.teaser_image = Set(paths.image_path);
        active.teaser_image_thumbnail1 = Set(paths.small);
        active.teaser_image_thumbnail2 = Set(paths.medium);
        active.teaser_image_thumbnail3 = Set(paths.large);
        let created = active.update(&txn).await?;

        let gallery_dir = staged.publish(created.id)?;

        if let Err(e) = txn.commit().await {
            tracing::error!("创建相册提交失败: gallery_id={}, error={}", created.id, e);
            if let Err(io) = std::fs::remove_dir_all(&gallery_dir) {
                tracing::warn!("清理相册目录失败: {}, error={}", gallery_dir.display(), io);
            }
            return Err(e.into());
        }

        tracing::info!(
            "成功创建相册: gallery_id={}, author={}",
            created.id,
            created.author
        );
        Ok(created.into())
    }

    /// 覆盖相册的状态、名称、描述和修改时间
    pub async fn edit_gallery(db: &DatabaseConnection, edit: GalleryEdit) -> ApiResult<GalleryResponse> {
        let (name, description) = encode_text_fields(&edit.name, &edit.description)?;
        let existing = Self::find_gallery(db, edit.id).await?;

        let mut active: gallery::ActiveModel = existing.into();
        active.status = Set(edit.status);
        active.name = Set(name);
        active.description = Set(description);
        active.modified_date = Set(edit.modified_date);
        let updated = active.update(db.as_ref()).await?;

        tracing::info!("成功更新相册: gallery_id={}", updated.id);
        Ok(updated.into())
    }

    /// 删除单个相册，并尽力删除其封面目录
    pub async fn delete_gallery_by_id(
        db: &DatabaseConnection,
        storage: &TeaserStorage,
        id: i32,
    ) -> ApiResult<()> {
        let existing = Self::find_gallery(db, id).await?;

        GalleryEntity::delete_by_id(id).exec(db.as_ref()).await?;
        Self::remove_media(storage, existing.author, id);

        tracing::info!("成功删除相册: gallery_id={}", id);
        Ok(())
    }

    /// 删除某个用户的所有相册，返回删除数量
    pub async fn delete_gallery_by_user(
        db: &DatabaseConnection,
        storage: &TeaserStorage,
        user_id: i32,
    ) -> ApiResult<u64> {
        let txn = db.begin().await?;

        let ids: Vec<i32> = GalleryEntity::find()
            .select_only()
            .column(gallery::Column::Id)
            .filter(gallery::Column::Author.eq(user_id))
            .into_tuple()
            .all(&txn)
            .await?;

        let result = GalleryEntity::delete_many()
            .filter(gallery::Column::Author.eq(user_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        for id in ids {
            Self::remove_media(storage, user_id, id);
        }

        tracing::info!(
            "成功删除用户相册: user_id={}, count={}",
            user_id,
            result.rows_affected
        );
        Ok(result.rows_affected)
    }

    /// 相册下的所有图片
    pub async fn get_images_by_gallery_id(
        db: &DatabaseConnection,
        gallery_id: i32,
    ) -> ApiResult<Vec<ImageResponse>> {
        let images = ImageEntity::find()
            .filter(image::Column::GalleryId.eq(gallery_id))
            .order_by_asc(image::Column::Id)
            .all(db.as_ref())
            .await?;

        tracing::debug!(
            "查询相册图片: gallery_id={}, count={}",
            gallery_id,
            images.len()
        );
        Ok(images.into_iter().map(Into::into).collect())
    }

    /// 相册属于该用户或用户为管理员时返回 true
    pub async fn check_ownership(
        db: &DatabaseConnection,
        user_id: i32,
        gallery_id: i32,
    ) -> ApiResult<bool> {
        let owned = GalleryEntity::find_by_id(gallery_id)
            .filter(gallery::Column::Author.eq(user_id))
            .one(db.as_ref())
            .await?
            .is_some();

        if owned {
            return Ok(true);
        }

        UserService::is_admin(db, user_id).await
    }

    /// 相册封面的平均亮度
    pub async fn teaser_luminance(
        db: &DatabaseConnection,
        storage: &TeaserStorage,
        gallery_id: i32,
        num_samples: u32,
        divisor: SampleDivisor,
    ) -> ApiResult<f64> {
        let existing = Self::find_gallery(db, gallery_id).await?;
        if existing.teaser_image.is_empty() {
            return Err(ApiError::NotFound("相册没有封面图片".to_string()));
        }

        let path = storage.resolve(&existing.teaser_image);
        let luminance =
            tokio::task::spawn_blocking(move || average_luminance(&path, num_samples, divisor))
                .await
                .map_err(|e| ApiError::Internal(format!("亮度计算任务失败: {e}")))??;

        Ok(luminance)
    }

    async fn find_gallery(db: &DatabaseConnection, id: i32) -> ApiResult<gallery::Model> {
        GalleryEntity::find_by_id(id)
            .one(db.as_ref())
            .await?
            .ok_or_else(|| {
                tracing::warn!("相册不存在: gallery_id={}", id);
                ApiError::NotFound("相册不存在".to_string())
            })
    }

    fn remove_media(storage: &TeaserStorage, user_id: i32, gallery_id: i32) {
        if let Err(e) = storage.remove_gallery_dir(user_id, gallery_id) {
            tracing::warn!(
                "删除相册目录失败: user_id={}, gallery_id={}, error={}",
                user_id,
                gallery_id,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_name_length_is_checked() {
        assert!(encode_text_fields(&"a".repeat(NAME_MAX_CHARS), "").is_ok());

        // 51 个 `"` 编码后为 306 个字符
        let err = encode_text_fields(&"\"".repeat(51), "").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = encode_text_fields(&"&".repeat(NAME_MAX_CHARS), "").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn encoded_description_length_is_checked() {
        let (_, description) = encode_text_fields("n", "<b>").unwrap();
        assert_eq!(description, "&lt;b&gt;");

        let err = encode_text_fields("n", &"<".repeat(DESCRIPTION_MAX_BYTES / 2)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
