// 本地文件系统浏览模块
//
// 把客户端路径限制在根目录之内，并提供目录列表

mod guard;
mod service;
mod types;

pub use guard::PathGuard;
pub use service::{sort_entries, FilesystemService};
pub use types::*;
