// 启动信息：局域网访问地址和终端二维码

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use anyhow::{Context, Result};
use qrcode::{render::unicode, QrCode};

/// 探测本机的局域网 IPv4 地址
///
/// UDP connect 不会发送数据，只让系统选出对外的网卡地址
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_loopback() || ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}

/// 浏览器访问地址
///
/// 监听通配地址时使用探测到的局域网地址，探测失败回退到 localhost
pub fn access_url(host: &str, port: u16) -> String {
    let display_host = match host.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() => local_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "localhost".to_string()),
        Ok(IpAddr::V6(ip)) => format!("[{}]", ip),
        _ => host.to_string(),
    };
    format!("http://{}:{}/", display_host, port)
}

/// 渲染终端二维码
pub fn render_qr(url: &str) -> Result<String> {
    let code = QrCode::new(url.as_bytes()).context("Failed to generate QR code")?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

/// 打印启动横幅
pub fn print_banner(url: &str) {
    println!();
    println!("\x1b[36m  FinderFI\x1b[0m  \x1b[2mv{}\x1b[0m", env!("CARGO_PKG_VERSION"));
    println!();
    println!("\x1b[1m\x1b[32m  Server running at: {}\x1b[0m", url);
    println!("\x1b[2m  Scan the QR code below with your phone to access.\x1b[0m");
    println!();

    match render_qr(url) {
        Ok(qr) => println!("{}\n", qr),
        Err(e) => tracing::warn!("二维码生成失败: {}", e),
    }
}
