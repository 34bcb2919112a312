//! 相册封面与缩略图生成
//!
//! 上传的图片先解码校验，再在暂存目录中渲染出封面 PNG 和三档缩略图，
//! 入库成功后整体移动到 `/data/media/gallery/{userId}/{galleryId}/`。

use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// 相册媒体目录（相对于文档根目录）
pub const GALLERY_MEDIA_DIR: &str = "/data/media/gallery";
/// 封面文件名（不含扩展名）
pub const TEASER_NAME: &str = "teaserImage";

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("无法确定上传文件的图片类型")]
    UndeterminedType,

    #[error("不支持的图片类型 {0}，仅支持 gif/jpeg/png")]
    UnsupportedType(String),

    #[error("封面图片不能是 GIF，必须是 JPEG 或 PNG")]
    GifTeaser,

    #[error("图片文件大小不能超过 {limit} 字节")]
    TooLarge { limit: usize },

    #[error("图片解码失败: {0}")]
    Decode(#[source] image::ImageError),

    #[error("图片编码失败: {0}")]
    Encode(#[source] image::ImageError),

    #[error("图片写入失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 允许上传的图片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Jpeg,
    Png,
}

impl ImageKind {
    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/gif" => Some(Self::Gif),
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            Self::Gif => ImageFormat::Gif,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// 缩略图档位，按固定高度等比缩放
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSize {
    Small,
    Medium,
    Large,
}

impl ThumbnailSize {
    pub const ALL: [ThumbnailSize; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn height(self) -> u32 {
        match self {
            Self::Small => 100,
            Self::Medium => 200,
            Self::Large => 400,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.{}.thumb.png", TEASER_NAME, self.name())
    }
}

/// `floor(width * target_height / height)`，至少 1 像素
pub fn thumbnail_width(width: u32, height: u32, target_height: u32) -> u32 {
    let scaled = u64::from(width) * u64::from(target_height) / u64::from(height.max(1));
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

/// 已通过校验并解码的上传图片
pub struct ValidatedImage {
    pub kind: ImageKind,
    pub image: DynamicImage,
}

/// 校验上传内容是否为 gif/jpeg/png 图片，并解码
pub fn check_image(content: &[u8], max_bytes: usize) -> Result<ValidatedImage, ImageError> {
    if content.len() > max_bytes {
        return Err(ImageError::TooLarge { limit: max_bytes });
    }

    let detected = infer::get(content).ok_or(ImageError::UndeterminedType)?;
    if detected.matcher_type() != infer::MatcherType::Image {
        return Err(ImageError::UndeterminedType);
    }

    let kind = ImageKind::from_mime(detected.mime_type())
        .ok_or_else(|| ImageError::UnsupportedType(detected.mime_type().to_string()))?;

    let image = image::load_from_memory_with_format(content, kind.format()).map_err(|e| {
        tracing::debug!("图片解码失败: kind={:?}, error={}", kind, e);
        ImageError::UndeterminedType
    })?;

    Ok(ValidatedImage { kind, image })
}

/// 封面与缩略图的存储路径（相对于文档根目录）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeaserPaths {
    pub image_path: String,
    pub small: String,
    pub medium: String,
    pub large: String,
}

impl TeaserPaths {
    pub fn for_gallery(user_id: i32, gallery_id: i32) -> Self {
        let folder = format!("{GALLERY_MEDIA_DIR}/{user_id}/{gallery_id}/");
        Self {
            image_path: format!("{folder}{TEASER_NAME}.png"),
            small: format!("{folder}{}", ThumbnailSize::Small.file_name()),
            medium: format!("{folder}{}", ThumbnailSize::Medium.file_name()),
            large: format!("{folder}{}", ThumbnailSize::Large.file_name()),
        }
    }
}

/// 将封面和三档缩略图写入 `dir`，调用方负责拒绝 GIF
fn render_teaser(source: &ValidatedImage, dir: &Path) -> Result<(), ImageError> {
    let image = &source.image;
    image
        .save_with_format(dir.join(format!("{TEASER_NAME}.png")), ImageFormat::Png)
        .map_err(ImageError::Encode)?;

    let (width, height) = (image.width(), image.height());
    for size in ThumbnailSize::ALL {
        let new_height = size.height();
        let new_width = thumbnail_width(width, height, new_height);

        image
            .resize_exact(new_width, new_height, FilterType::Lanczos3)
            .save_with_format(dir.join(size.file_name()), ImageFormat::Png)
            .map_err(ImageError::Encode)?;

        tracing::debug!(
            "生成缩略图: size={}, {}x{} -> {}x{}",
            size.name(),
            width,
            height,
            new_width,
            new_height
        );
    }

    Ok(())
}

/// 文档根目录下的相册媒体存储
#[derive(Debug, Clone)]
pub struct TeaserStorage {
    root: PathBuf,
}

impl TeaserStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 将文档根目录相对路径解析为文件系统路径
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }

    fn user_dir(&self, user_id: i32) -> PathBuf {
        self.resolve(&format!("{GALLERY_MEDIA_DIR}/{user_id}"))
    }

    pub fn gallery_dir(&self, user_id: i32, gallery_id: i32) -> PathBuf {
        self.user_dir(user_id).join(gallery_id.to_string())
    }

    /// 在用户目录下的暂存目录中渲染封面，失败时清理暂存目录。
    /// GIF 只能作为普通上传，不能作为封面，在创建任何目录之前拒绝。
    pub fn stage(&self, user_id: i32, source: &ValidatedImage) -> Result<StagedTeaser, ImageError> {
        if source.kind == ImageKind::Gif {
            return Err(ImageError::GifTeaser);
        }

        let user_dir = self.user_dir(user_id);
        let dir = user_dir.join(format!(".staging-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir)?;

        // 出错时由 Drop 清理
        let staged = StagedTeaser {
            dir,
            user_dir,
            user_id,
            published: false,
        };
        render_teaser(source, &staged.dir)?;

        Ok(staged)
    }

    /// 删除相册的媒体目录，目录不存在时忽略
    pub fn remove_gallery_dir(&self, user_id: i32, gallery_id: i32) -> std::io::Result<()> {
        match std::fs::remove_dir_all(self.gallery_dir(user_id, gallery_id)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// 暂存中的封面文件，未发布前被丢弃会自动删除
#[derive(Debug)]
pub struct StagedTeaser {
    dir: PathBuf,
    user_dir: PathBuf,
    user_id: i32,
    published: bool,
}

impl StagedTeaser {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths_for(&self, gallery_id: i32) -> TeaserPaths {
        TeaserPaths::for_gallery(self.user_id, gallery_id)
    }

    /// 把暂存目录重命名为正式的相册目录，返回正式目录
    pub fn publish(mut self, gallery_id: i32) -> std::io::Result<PathBuf> {
        let target = self.user_dir.join(gallery_id.to_string());
        if target.exists() {
            tracing::warn!("相册目录已存在，将被覆盖: {}", target.display());
            std::fs::remove_dir_all(&target)?;
        }
        std::fs::rename(&self.dir, &target)?;
        self.published = true;
        Ok(target)
    }
}

impl Drop for StagedTeaser {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("清理暂存目录失败: {}, error={}", self.dir.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, format)
            .unwrap();
        buf.into_inner()
    }

    const LIMIT: usize = 10 * 1024 * 1024;

    #[test]
    fn width_is_floored_and_proportional() {
        assert_eq!(thumbnail_width(640, 480, 100), 133);
        assert_eq!(thumbnail_width(640, 480, 400), 533);
        assert_eq!(thumbnail_width(300, 900, 200), 66);
        assert_eq!(thumbnail_width(800, 400, 100), 200);
    }

    #[test]
    fn width_never_collapses_to_zero() {
        assert_eq!(thumbnail_width(1, 5000, 100), 1);
    }

    #[test]
    fn rejects_non_image_content() {
        let err = check_image(b"definitely not an image", LIMIT).err().unwrap();
        assert!(matches!(err, ImageError::UndeterminedType));
    }

    #[test]
    fn rejects_truncated_png() {
        let mut bytes = encode(20, 20, ImageFormat::Png);
        bytes.truncate(40);
        let err = check_image(&bytes, LIMIT).err().unwrap();
        assert!(matches!(err, ImageError::UndeterminedType));
    }

    #[test]
    fn rejects_other_image_types() {
        let bytes = encode(8, 8, ImageFormat::Bmp);
        let err = check_image(&bytes, LIMIT).err().unwrap();
        assert!(matches!(err, ImageError::UnsupportedType(ref mime) if mime == "image/bmp"));
    }

    #[test]
    fn rejects_oversized_upload() {
        let bytes = encode(32, 32, ImageFormat::Png);
        let err = check_image(&bytes, 16).err().unwrap();
        assert!(matches!(err, ImageError::TooLarge { limit: 16 }));
    }

    #[test]
    fn accepts_gif_but_refuses_it_as_teaser() {
        let dir = tempfile::tempdir().unwrap();
        let validated = check_image(&encode(30, 20, ImageFormat::Gif), LIMIT).unwrap();
        assert_eq!(validated.kind, ImageKind::Gif);

        let storage = TeaserStorage::new(dir.path());
        let err = storage.stage(7, &validated).err().unwrap();
        assert!(matches!(err, ImageError::GifTeaser));
        assert!(!dir.path().join("data/media/gallery/7").exists());
    }

    #[test]
    fn stages_teaser_and_three_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TeaserStorage::new(dir.path());
        let validated = check_image(&encode(640, 480, ImageFormat::Jpeg), LIMIT).unwrap();
        assert_eq!(validated.kind, ImageKind::Jpeg);

        let staged = storage.stage(3, &validated).unwrap();
        let staging_dir = staged.dir().to_path_buf();
        assert_eq!(std::fs::read_dir(&staging_dir).unwrap().count(), 4);

        let target = staged.publish(12).unwrap();
        assert!(!staging_dir.exists());
        assert_eq!(target, storage.gallery_dir(3, 12));

        let teaser = image::open(target.join("teaserImage.png")).unwrap();
        assert_eq!((teaser.width(), teaser.height()), (640, 480));

        for (name, width, height) in [("small", 133, 100), ("medium", 266, 200), ("large", 533, 400)] {
            let thumb = image::open(target.join(format!("teaserImage.{name}.thumb.png"))).unwrap();
            assert_eq!((thumb.width(), thumb.height()), (width, height), "{name}");
        }
    }

    #[test]
    fn dropping_unpublished_stage_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TeaserStorage::new(dir.path());
        let validated = check_image(&encode(50, 50, ImageFormat::Png), LIMIT).unwrap();

        let staged = storage.stage(1, &validated).unwrap();
        let staging_dir = staged.dir().to_path_buf();
        assert!(staging_dir.exists());
        drop(staged);
        assert!(!staging_dir.exists());
    }

    #[test]
    fn paths_follow_media_layout() {
        let paths = TeaserPaths::for_gallery(5, 42);
        assert_eq!(paths.image_path, "/data/media/gallery/5/42/teaserImage.png");
        assert_eq!(paths.small, "/data/media/gallery/5/42/teaserImage.small.thumb.png");
        assert_eq!(paths.medium, "/data/media/gallery/5/42/teaserImage.medium.thumb.png");
        assert_eq!(paths.large, "/data/media/gallery/5/42/teaserImage.large.thumb.png");
    }
}
