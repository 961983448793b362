// 图片缩略图
//
// 解码 -> cover 方式缩放裁剪 -> 固定质量 JPEG

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ColorType;

use super::error::ThumbnailError;

/// 生成图片缩略图的 JPEG 字节
///
/// 解码和缩放是 CPU 密集操作，放到阻塞线程池执行
pub(crate) async fn render_image(
    path: &Path,
    size: u32,
    quality: u8,
) -> Result<Vec<u8>, ThumbnailError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || encode_cover_jpeg(&path, size, quality))
        .await
        .map_err(|e| ThumbnailError::Join {
            reason: e.to_string(),
        })?
}

fn encode_cover_jpeg(path: &Path, size: u32, quality: u8) -> Result<Vec<u8>, ThumbnailError> {
    let source = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => ThumbnailError::Io(io),
        other => ThumbnailError::Decode {
            reason: other.to_string(),
        },
    })?;

    // resize_to_fill: 保持比例放大/缩小到覆盖目标框，再居中裁剪
    let thumb = source.resize_to_fill(size, size, FilterType::Triangle).to_rgb8();

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode(thumb.as_raw(), thumb.width(), thumb.height(), ColorType::Rgb8)
        .map_err(|e| ThumbnailError::Encode {
            reason: e.to_string(),
        })?;

    Ok(buffer.into_inner())
}
