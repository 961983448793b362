// 缩略图生成模块
//
// 图片在进程内解码缩放，视频交给外部截帧程序。
// 生成失败只表示“没有缩略图”，由调用方决定如何展示。

mod error;
mod picture;
mod video;

use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::ThumbnailConfig;
use crate::filesystem::{MediaKind, ResolvedPath};

pub use error::ThumbnailError;
pub use video::{FfmpegExtractor, FrameExtractor, FrameRequest};

/// 缩略图输出格式固定为 JPEG
pub const THUMBNAIL_MIME: &str = "image/jpeg";

/// 生成好的缩略图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    mime: &'static str,
    data: String,
}

impl Thumbnail {
    fn from_jpeg(bytes: &[u8]) -> Self {
        Self {
            mime: THUMBNAIL_MIME,
            data: STANDARD.encode(bytes),
        }
    }

    pub fn mime_type(&self) -> &str {
        self.mime
    }

    /// base64 编码后的图片数据
    pub fn base64(&self) -> &str {
        &self.data
    }

    /// `data:image/jpeg;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// 缩略图生成器
///
/// 不做缓存，每次请求都重新生成
#[derive(Clone)]
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
    temp_dir: PathBuf,
    extractor: Arc<dyn FrameExtractor>,
}

impl ThumbnailGenerator {
    /// 使用 ffmpeg 截取视频帧
    pub fn new(config: ThumbnailConfig) -> Self {
        let extractor = Arc::new(FfmpegExtractor::new(config.ffmpeg_path.clone()));
        Self::with_extractor(config, extractor)
    }

    /// 使用自定义的截帧实现
    pub fn with_extractor(config: ThumbnailConfig, extractor: Arc<dyn FrameExtractor>) -> Self {
        let temp_dir = config.resolved_temp_dir();
        Self {
            config,
            temp_dir,
            extractor,
        }
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// 为单个文件生成缩略图
    pub async fn generate(
        &self,
        path: &ResolvedPath,
        kind: MediaKind,
    ) -> Result<Thumbnail, ThumbnailError> {
        let size = self.config.size;
        let quality = self.config.clamped_quality();

        let bytes = match kind {
            MediaKind::Image => picture::render_image(path.as_path(), size, quality).await?,
            MediaKind::Video => {
                let request = FrameRequest {
                    offset_secs: self.config.video_offset_secs,
                    size,
                    quality,
                    timeout: self.config.extract_timeout(),
                };
                video::capture_frame(
                    self.extractor.as_ref(),
                    path.as_path(),
                    &self.temp_dir,
                    &request,
                )
                .await?
            }
            MediaKind::Other => return Err(ThumbnailError::Unsupported { kind }),
        };

        tracing::debug!(
            "缩略图生成成功: {} ({} bytes)",
            path.relative(),
            bytes.len()
        );
        Ok(Thumbnail::from_jpeg(&bytes))
    }

    /// 生成缩略图，失败时记录日志并返回 None
    pub async fn generate_optional(
        &self,
        path: &ResolvedPath,
        kind: MediaKind,
    ) -> Option<Thumbnail> {
        if !kind.is_media() {
            return None;
        }
        match self.generate(path, kind).await {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) if e.is_timeout() => {
                tracing::warn!("缩略图生成超时: {}, {}", path.relative(), e);
                None
            }
            Err(e) => {
                tracing::warn!("缩略图生成失败: {}, {}", path.relative(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::video::tests::CopyExtractor;
    use super::*;
    use crate::filesystem::PathGuard;
    use image::GenericImageView;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn generator_with_copy(temp_dir: &TempDir, delay: Duration) -> ThumbnailGenerator {
        ThumbnailGenerator::with_extractor(
            ThumbnailConfig {
                temp_dir: Some(temp_dir.path().to_path_buf()),
                ..Default::default()
            },
            Arc::new(CopyExtractor { delay }),
        )
    }

    fn decode_data_url(url: &str) -> Vec<u8> {
        let payload = url.strip_prefix("data:image/jpeg;base64,").unwrap();
        STANDARD.decode(payload).unwrap()
    }

    #[test]
    fn test_data_url_format() {
        let thumbnail = Thumbnail::from_jpeg(b"abc");
        assert_eq!(thumbnail.mime_type(), "image/jpeg");
        assert_eq!(thumbnail.base64(), "YWJj");
        assert_eq!(thumbnail.to_data_url(), "data:image/jpeg;base64,YWJj");
    }

    #[tokio::test]
    async fn test_other_kind_is_unsupported() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("notes.txt"), "hello").unwrap();
        let guard = PathGuard::new(root.path()).unwrap();
        let path = guard.resolve("notes.txt").unwrap();

        let generator = ThumbnailGenerator::new(ThumbnailConfig::default());
        let err = generator.generate(&path, MediaKind::Other).await.unwrap_err();
        assert!(matches!(err, ThumbnailError::Unsupported { .. }));
        assert!(generator.generate_optional(&path, MediaKind::Other).await.is_none());
    }

    #[tokio::test]
    async fn test_image_thumbnail_end_to_end() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("pics")).unwrap();
        image::RgbImage::from_pixel(320, 240, image::Rgb([200, 120, 40]))
            .save(root.path().join("pics/cat.jpg"))
            .unwrap();
        fs::write(root.path().join("pics/..hidden"), "secret").unwrap();

        let guard = PathGuard::new(root.path()).unwrap();

        let path = guard.resolve("pics/../pics/cat.jpg").unwrap();
        assert_eq!(path.as_path(), guard.root().join("pics/cat.jpg"));

        let generator = ThumbnailGenerator::new(ThumbnailConfig {
            temp_dir: Some(root.path().to_path_buf()),
            ..Default::default()
        });
        let thumbnail = generator.generate(&path, MediaKind::Image).await.unwrap();
        let url = thumbnail.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let decoded = image::load_from_memory(&decode_data_url(&url)).unwrap();
        assert_eq!(decoded.dimensions(), (200, 200));

        let err = guard.resolve("../../etc").unwrap_err();
        assert_eq!(err.code, crate::filesystem::FsErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_video_thumbnail_uses_extractor() {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        fs::write(root.path().join("clip.mp4"), b"jpeg-from-clip").unwrap();

        let guard = PathGuard::new(root.path()).unwrap();
        let path = guard.resolve("clip.mp4").unwrap();
        let generator = generator_with_copy(&temp, Duration::from_millis(0));

        let thumbnail = generator.generate(&path, MediaKind::Video).await.unwrap();
        assert_eq!(decode_data_url(&thumbnail.to_data_url()), b"jpeg-from-clip");
        assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_videos_do_not_mix() {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        fs::write(root.path().join("a.mp4"), b"frame-of-a").unwrap();
        fs::write(root.path().join("b.mp4"), b"frame-of-b").unwrap();

        let guard = PathGuard::new(root.path()).unwrap();
        let a = guard.resolve("a.mp4").unwrap();
        let b = guard.resolve("b.mp4").unwrap();
        let generator = generator_with_copy(&temp, Duration::from_millis(50));

        let (thumb_a, thumb_b) = tokio::join!(
            generator.generate(&a, MediaKind::Video),
            generator.generate(&b, MediaKind::Video),
        );

        assert_eq!(decode_data_url(&thumb_a.unwrap().to_data_url()), b"frame-of-a");
        assert_eq!(decode_data_url(&thumb_b.unwrap().to_data_url()), b"frame-of-b");
        assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_yields_none() {
        let root = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        fs::write(root.path().join("clip.mov"), b"not a video").unwrap();

        let guard = PathGuard::new(root.path()).unwrap();
        let path = guard.resolve("clip.mov").unwrap();
        let generator = ThumbnailGenerator::new(ThumbnailConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg-finderfi"),
            temp_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        });

        assert!(generator.generate_optional(&path, MediaKind::Video).await.is_none());
        assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
    }
}
