use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use finderfi_rust::{
    banner,
    config::{AppConfig, PathValidator},
    logging, server, AppState,
};
use tracing::info;

/// 局域网文件浏览服务
#[derive(Debug, Parser)]
#[command(name = "finderfi", version, about = "Browse a local directory from any device on the LAN")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/app.toml")]
    config: String,

    /// 共享的根目录（覆盖配置文件）
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// 监听地址
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(root) = self.root {
            config.filesystem.root_dir = root;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

/// 检测静态资源目录
/// 按顺序尝试：
/// 1. ./public - 源码目录直接运行
/// 2. {exe_dir}/public - 与可执行文件一起部署
/// 3. /app/public - Docker 容器
fn detect_public_dir() -> PathBuf {
    let mut candidates = vec![PathBuf::from("./public")];

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("public"));
        }
    }
    candidates.push(PathBuf::from("/app/public"));

    for path in &candidates {
        // style.css 存在才认为是有效的资源目录
        if path.is_dir() && path.join("style.css").exists() {
            info!(
                "✓ 找到静态资源目录: {:?}",
                dunce::canonicalize(path).unwrap_or_else(|_| path.clone())
            );
            return path.clone();
        }
    }

    let default = PathBuf::from("./public");
    tracing::warn!(
        "⚠️  未找到静态资源目录，使用默认路径: {:?}\n尝试过的路径: {:?}",
        default,
        candidates
    );
    default
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(&args.config).await;
    args.apply(&mut config);

    // 必须保持 _log_guard 存活
    let _log_guard = logging::init_logging(&config.log);

    info!("FinderFI v{} 启动中...", env!("CARGO_PKG_VERSION"));

    // 根目录校验失败直接退出
    PathValidator::into_result(PathValidator::validate_root(&config.filesystem.root_dir))
        .with_context(|| format!("根目录不可用: {:?}", config.filesystem.root_dir))?;

    let temp_dir = config.thumbnail.resolved_temp_dir();
    PathValidator::ensure_directory_exists(&temp_dir)?;
    let temp_check = PathValidator::validate_temp_dir(&temp_dir);
    if !temp_check.valid {
        // 临时目录不可写只影响视频缩略图
        tracing::warn!("截帧临时目录不可用: {:?}, {}", temp_dir, temp_check.message);
    }

    let addr = config.server.bind_addr();
    let url = banner::access_url(&config.server.host, config.server.port);

    let app_state = AppState::new(config)?;
    info!("共享根目录: {:?}", app_state.fs.guard().root());

    let app = server::router(app_state, &detect_public_dir());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听地址失败: {}", addr))?;

    info!("服务器启动在: http://{}", addr);
    info!("健康检查: http://{}/health", addr);
    banner::print_banner(&url);

    // 使用 select! 监听关闭信号
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("服务器错误: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("收到 Ctrl+C，开始关闭...");
        }
    }

    info!("应用已安全退出");
    Ok(())
}
