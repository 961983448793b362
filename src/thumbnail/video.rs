// 视频缩略图
//
// 外部截帧程序把单帧写入临时文件，读取后立即删除。
// 临时文件名由高精度时间戳、进程号和进程内递增序号组成，并发请求之间不会冲突。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};

use super::error::ThumbnailError;

/// 截帧程序被强制结束后留给它退出的时间
const KILL_GRACE: Duration = Duration::from_secs(2);

static FRAME_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 单次截帧参数
#[derive(Debug, Clone)]
pub struct FrameRequest {
    /// 截帧时间点（秒）
    pub offset_secs: f64,
    /// 输出边长（像素）
    pub size: u32,
    /// JPEG 质量（1-100）
    pub quality: u8,
    /// 超时时间
    pub timeout: Duration,
}

/// 外部截帧能力
///
/// 实现方把 `source` 在指定时间点的一帧缩放后写到 `destination`。
/// 返回 Ok 但没有写出文件（例如视频短于截帧时间点）同样视为失败。
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frame(
        &self,
        source: &Path,
        destination: &Path,
        request: &FrameRequest,
    ) -> Result<(), ThumbnailError>;
}

/// 基于 ffmpeg 命令行的截帧实现
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    binary: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn build_command(&self, source: &Path, destination: &Path, request: &FrameRequest) -> Command {
        let size = request.size;
        let filter = format!(
            "scale={size}:{size}:force_original_aspect_ratio=increase,crop={size}:{size}"
        );

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-hide_banner")
            .args(["-loglevel", "error", "-nostdin"])
            .arg("-ss")
            .arg(format!("{:.3}", request.offset_secs.max(0.0)))
            .arg("-i")
            .arg(source)
            .args(["-frames:v", "1", "-vf"])
            .arg(filter)
            .arg("-q:v")
            .arg(jpeg_qscale(request.quality).to_string())
            .arg("-y")
            .arg(destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract_frame(
        &self,
        source: &Path,
        destination: &Path,
        request: &FrameRequest,
    ) -> Result<(), ThumbnailError> {
        let mut child = self
            .build_command(source, destination, request)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ThumbnailError::extraction(format!(
                    "找不到 ffmpeg 可执行文件: {:?}",
                    self.binary
                )),
                _ => ThumbnailError::extraction(format!("启动 ffmpeg 失败: {}", e)),
            })?;

        let (status, message) = wait_child(&mut child, request.timeout).await?;

        if !status.success() {
            let last_line = message.lines().last().unwrap_or("").trim().to_string();
            return Err(ThumbnailError::extraction(format!(
                "ffmpeg 退出码 {:?}: {}",
                status.code(),
                last_line
            )));
        }

        Ok(())
    }
}

/// 等待子进程退出，同时读完 stderr
///
/// stderr 管道写满时子进程会阻塞，所以读取和等待必须并行。
/// 超时后结束进程再返回，避免它在临时文件删除后继续写入
async fn wait_child(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, String), ThumbnailError> {
    let stderr = child.stderr.take();

    let waited = tokio::time::timeout(timeout, async {
        tokio::join!(child.wait(), read_stderr(stderr))
    })
    .await;

    match waited {
        Ok((status, message)) => {
            let status = status
                .map_err(|e| ThumbnailError::extraction(format!("等待 ffmpeg 退出失败: {}", e)))?;
            Ok((status, message))
        }
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!("结束超时的 ffmpeg 进程失败: {}", e);
            }
            Err(ThumbnailError::TimedOut {
                secs: timeout.as_secs(),
            })
        }
    }
}

async fn read_stderr(stderr: Option<ChildStderr>) -> String {
    let mut message = String::new();
    if let Some(mut stderr) = stderr {
        if let Err(e) = stderr.read_to_string(&mut message).await {
            tracing::debug!("读取 ffmpeg 输出失败: {}", e);
        }
    }
    message
}

/// 把 1-100 的质量映射到 ffmpeg mjpeg 的 qscale（2 最好，31 最差）
fn jpeg_qscale(quality: u8) -> u32 {
    let quality = u32::from(quality.clamp(1, 100));
    2 + (100 - quality) * 29 / 99
}

/// 截帧临时文件
///
/// 由单次调用独占；无论成功、失败、超时还是调用被取消，离开作用域时都会删除
pub(crate) struct TempFrame {
    path: PathBuf,
    removed: bool,
}

impl TempFrame {
    pub(crate) fn allocate(dir: &Path) -> Self {
        Self {
            path: dir.join(unique_frame_name()),
            removed: false,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) async fn remove(mut self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => self.removed = true,
            Err(e) if e.kind() == ErrorKind::NotFound => self.removed = true,
            Err(e) => {
                tracing::warn!("删除截帧临时文件失败: {:?}, 错误: {}", self.path, e);
            }
        }
    }
}

impl Drop for TempFrame {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!("删除截帧临时文件失败: {:?}, 错误: {}", self.path, e);
            }
        }
    }
}

fn unique_frame_name() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let seq = FRAME_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("thumbnail-{}-{}-{}.jpg", nanos, std::process::id(), seq)
}

/// 截取一帧并返回 JPEG 字节，临时文件在返回前删除
pub(crate) async fn capture_frame(
    extractor: &dyn FrameExtractor,
    source: &Path,
    temp_dir: &Path,
    request: &FrameRequest,
) -> Result<Vec<u8>, ThumbnailError> {
    let frame = TempFrame::allocate(temp_dir);
    tracing::debug!("截帧: {:?} -> {:?}", source, frame.path());

    // 截帧实现自身应当遵守超时，这里再加一层兜底
    let outcome = tokio::time::timeout(
        request.timeout.saturating_add(KILL_GRACE),
        extractor.extract_frame(source, frame.path(), request),
    )
    .await;

    let result = match outcome {
        Err(_) => Err(ThumbnailError::TimedOut {
            secs: request.timeout.as_secs(),
        }),
        Ok(Err(e)) => Err(e),
        Ok(Ok(())) => read_frame(frame.path()).await,
    };

    frame.remove().await;
    result
}

async fn read_frame(path: &Path) -> Result<Vec<u8>, ThumbnailError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Err(ThumbnailError::extraction("截帧结果为空")),
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ThumbnailError::extraction(
            "没有生成截帧文件（视频可能短于截帧时间点）",
        )),
        Err(e) => Err(ThumbnailError::Io(e)),
    }
}
