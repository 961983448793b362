// 启动路径校验
//
// 根目录必须是可读目录，截帧临时目录必须是可写目录

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// 路径验证结果
#[derive(Debug, Clone, Serialize)]
pub struct PathValidationResult {
    /// 路径是否完全可用
    pub valid: bool,
    /// 路径是否存在
    pub exists: bool,
    /// 是否是目录
    pub is_directory: bool,
    /// 是否可读（可列目录）
    pub is_readable: bool,
    /// 是否可写（仅临时目录检查）
    pub is_writable: bool,
    /// 验证消息
    pub message: String,
    /// 详细错误信息（如果有）
    pub details: Option<String>,
}

impl PathValidationResult {
    fn failure(message: &str, details: String) -> Self {
        Self {
            valid: false,
            exists: false,
            is_directory: false,
            is_readable: false,
            is_writable: false,
            message: message.to_string(),
            details: Some(details),
        }
    }
}

/// 路径验证器
pub struct PathValidator;

impl PathValidator {
    /// 校验共享根目录：存在、是目录、可列出
    pub fn validate_root(path: &Path) -> PathValidationResult {
        let mut result = match Self::check_directory(path) {
            Ok(result) => result,
            Err(failure) => return failure,
        };

        if fs::read_dir(path).is_err() {
            result.valid = false;
            result.message = "路径不可读".to_string();
            result.details = Some(format!("无法列出目录 {:?}，请检查目录权限", path));
            return result;
        }

        result.is_readable = true;
        result
    }

    /// 校验临时目录：存在、是目录、可写
    pub fn validate_temp_dir(path: &Path) -> PathValidationResult {
        let mut result = match Self::check_directory(path) {
            Ok(result) => result,
            Err(failure) => return failure,
        };

        if !Self::check_writable(path) {
            result.valid = false;
            result.message = "路径不可写".to_string();
            result.details = Some(format!("路径 {:?} 没有写入权限，无法生成视频缩略图", path));
            return result;
        }

        result.is_writable = true;
        result
    }

    fn check_directory(path: &Path) -> Result<PathValidationResult, PathValidationResult> {
        if !path.exists() {
            return Err(PathValidationResult::failure(
                "路径不存在",
                format!("路径 {:?} 不存在，请确保路径正确", path),
            ));
        }

        if !path.is_dir() {
            let mut failure = PathValidationResult::failure(
                "路径不是目录",
                format!("路径 {:?} 不是一个目录，请指定目录路径", path),
            );
            failure.exists = true;
            return Err(failure);
        }

        Ok(PathValidationResult {
            valid: true,
            exists: true,
            is_directory: true,
            is_readable: false,
            is_writable: false,
            message: "路径验证通过".to_string(),
            details: None,
        })
    }

    /// 通过创建并删除一个探测文件检测写入权限
    fn check_writable(path: &Path) -> bool {
        let test_file = path.join(format!(".finderfi-write-test-{}", std::process::id()));

        match fs::File::create(&test_file) {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
                true
            }
            Err(_) => false,
        }
    }

    /// 把验证结果转换成带友好信息的错误
    pub fn into_result(result: PathValidationResult) -> Result<()> {
        if !result.valid {
            let error_msg = match result.details {
                Some(details) => format!("{}\n详情: {}", result.message, details),
                None => result.message,
            };
            anyhow::bail!(error_msg);
        }
        Ok(())
    }

    /// 自动创建目录（如果不存在）
    pub fn ensure_directory_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("无法创建目录: {:?}", path))?;
            tracing::info!("自动创建临时目录: {:?}", path);
        }
        Ok(())
    }
}
