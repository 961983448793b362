// 文件系统服务
//
// 提供目录列表、条目类型查询和文件打开等功能，所有路径都先经过 PathGuard

use std::cmp::Ordering;
use std::fs::Metadata;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::fs;

use super::guard::PathGuard;
use super::types::*;
use crate::thumbnail::ThumbnailGenerator;

/// 文件系统服务
#[derive(Debug, Clone)]
pub struct FilesystemService {
    guard: PathGuard,
}

impl FilesystemService {
    /// 创建新的文件系统服务
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// 解析客户端提交的路径
    pub fn resolve(&self, raw: &str) -> Result<ResolvedPath, FsError> {
        self.guard.resolve(raw)
    }

    /// 查询条目类型
    pub async fn entry_type(&self, path: &ResolvedPath) -> Result<EntryType, FsError> {
        let metadata = fs::metadata(path.as_path())
            .await
            .map_err(|e| self.io_error(&e, path))?;
        Ok(if metadata.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        })
    }

    /// 列出目录内容
    ///
    /// 每个子条目独立 stat，全部完成后再排序，输出顺序与完成顺序无关
    pub async fn list_directory(&self, dir: &ResolvedPath) -> Result<ListResponse, FsError> {
        if self.entry_type(dir).await? != EntryType::Directory {
            return Err(FsError::new(FsErrorCode::NotADirectory).with_path(dir.relative()));
        }

        let mut read_dir = fs::read_dir(dir.as_path()).await.map_err(|e| {
            tracing::error!("读取目录失败: {:?}, 错误: {}", dir.as_path(), e);
            self.io_error(&e, dir)
        })?;

        let mut names = Vec::new();
        loop {
            match read_dir.next_entry().await {
                Ok(Some(entry)) => match entry.file_name().into_string() {
                    Ok(name) if !PathGuard::is_hidden(&name) => names.push(name),
                    Ok(_) => {}
                    Err(raw) => {
                        tracing::warn!("跳过非 UTF-8 文件名: {:?}", raw);
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("遍历目录时出错: {:?}, 错误: {}", dir.as_path(), e);
                    break;
                }
            }
        }

        let tasks = names.iter().map(|name| self.to_file_entry(dir, name));
        let mut entries: Vec<FileEntry> = join_all(tasks).await.into_iter().flatten().collect();

        sort_entries(&mut entries);

        Ok(ListResponse {
            total: entries.len(),
            entries,
            current_path: dir.relative().to_string(),
            parent_path: dir.parent_relative(),
        })
    }

    /// 列出目录并为每个图片/视频预生成缩略图
    ///
    /// 单个文件生成失败只会让该条目没有缩略图，不影响整个列表
    pub async fn list_with_thumbnails(
        &self,
        dir: &ResolvedPath,
        generator: &ThumbnailGenerator,
    ) -> Result<ListResponse, FsError> {
        let mut listing = self.list_directory(dir).await?;

        let tasks = listing.entries.iter().map(|entry| async move {
            if entry.is_dir() || !entry.media_kind.is_media() {
                return None;
            }
            let path = self.guard.resolve_child(dir, &entry.name).ok()?;
            generator
                .generate_optional(&path, entry.media_kind)
                .await
                .map(|thumbnail| thumbnail.to_data_url())
        });
        let thumbnails = join_all(tasks).await;

        for (entry, thumbnail) in listing.entries.iter_mut().zip(thumbnails) {
            entry.thumbnail = thumbnail;
        }

        Ok(listing)
    }

    /// 打开普通文件用于下载
    pub async fn open_file(&self, path: &ResolvedPath) -> Result<(fs::File, Metadata), FsError> {
        let metadata = fs::metadata(path.as_path())
            .await
            .map_err(|e| self.io_error(&e, path))?;
        if !metadata.is_file() {
            return Err(FsError::new(FsErrorCode::NotAFile).with_path(path.relative()));
        }

        let file = fs::File::open(path.as_path())
            .await
            .map_err(|e| self.io_error(&e, path))?;
        Ok((file, metadata))
    }

    /// 将目录项转换为 FileEntry，失败（竞争删除、越界链接等）时跳过
    async fn to_file_entry(&self, dir: &ResolvedPath, name: &str) -> Option<FileEntry> {
        let child = match self.guard.resolve_child(dir, name) {
            Ok(child) => child,
            Err(e) if e.code == FsErrorCode::BadRequest => {
                tracing::warn!("名称无法通过 URL 访问，跳过目录项: {:?}", name);
                return None;
            }
            Err(e) => {
                tracing::debug!("跳过目录项 {:?}: {}", name, e);
                return None;
            }
        };

        let metadata = match fs::metadata(child.as_path()).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!("获取元数据失败，跳过 {:?}: {}", name, e);
                return None;
            }
        };

        let entry_type = if metadata.is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        };

        let size = if metadata.is_file() {
            Some(metadata.len())
        } else {
            None
        };

        let updated_at = metadata.modified().ok().map(to_utc);
        let created_at = metadata.created().ok().map(to_utc).or(updated_at);

        let media_kind = match entry_type {
            EntryType::Directory => MediaKind::Other,
            EntryType::File => MediaKind::from_name(name),
        };

        Some(FileEntry {
            name: name.to_string(),
            entry_type,
            media_kind,
            size,
            created_at,
            updated_at,
            path: child.relative().to_string(),
            thumbnail: None,
        })
    }

    fn io_error(&self, err: &std::io::Error, path: &ResolvedPath) -> FsError {
        let fs_error = FsError::from_io(err).with_path(path.relative());
        if fs_error.code == FsErrorCode::Internal {
            tracing::error!("文件系统错误: {:?}, 错误: {}", path.as_path(), err);
        }
        fs_error
    }
}

/// 文件夹在前，组内按名称不区分大小写排序
pub fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| match (a.entry_type, b.entry_type) {
        (EntryType::Directory, EntryType::File) => Ordering::Less,
        (EntryType::File, EntryType::Directory) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    });
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    time.into()
}
