// 目录页面渲染

use chrono::{DateTime, Local, TimeZone, Utc};
use maud::{html, Markup, DOCTYPE};

use crate::filesystem::{FileEntry, ListResponse, MediaKind};

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// 人类可读的文件大小，保留一位小数
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

/// 按本地时区显示，例如 `Mar 5, 2024, 03:07 PM`
pub fn format_date(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => format_timestamp(&time.with_timezone(&Local)),
        None => String::new(),
    }
}

fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// 编码形式的相对路径解码后用于展示
pub fn display_path(relative: &str) -> String {
    urlencoding::decode(relative)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| relative.to_string())
}

/// 目录链接，`relative` 已是逐段编码的形式
fn directory_href(relative: &str) -> String {
    if relative == "/" {
        relative.to_string()
    } else {
        format!("{}/", relative)
    }
}

/// 文件下载链接，`relative` 已是逐段编码的形式
pub fn file_href(relative: &str) -> String {
    format!("/file{}", relative)
}

/// 渲染目录页面
pub fn directory_page(listing: &ListResponse) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "FinderFI - " (display_path(&listing.current_path)) }
                link rel="stylesheet" href="/public/style.css";
                script src="/public/app.js" defer {}
            }
            body {
                div.header {
                    a.button href="/" { "Home" }
                    @if let Some(parent) = &listing.parent_path {
                        a.button href=(directory_href(parent)) { "Up" }
                    }
                    a.button #refresh href="#" onclick="location.reload(); return false;" { "Refresh" }
                    input #search type="search" placeholder="Search" autocomplete="off";
                }
                div.current-path { (display_path(&listing.current_path)) }
                div.file-list {
                    @if listing.entries.is_empty() {
                        div.empty { "This folder is empty" }
                    }
                    @for entry in &listing.entries {
                        (file_item(entry))
                    }
                }
            }
        }
    }
}

fn file_item(entry: &FileEntry) -> Markup {
    let is_dir = entry.is_dir();
    let is_image = !is_dir && entry.media_kind == MediaKind::Image;
    let is_video = !is_dir && entry.media_kind == MediaKind::Video;
    let thumbnail_path = (is_image || is_video).then_some(entry.path.as_str());

    html! {
        div.file-item
            data-name=(entry.name.to_lowercase())
            data-is-directory=(if is_dir { "true" } else { "false" })
            data-thumbnail-request-path=[thumbnail_path]
            data-is-image=[is_image.then_some("true")]
            data-is-video=[is_video.then_some("true")]
        {
            @if is_dir {
                a href=(directory_href(&entry.path)) {
                    div.icon.folder {}
                    div.file-info {
                        div.file-name { (entry.name) }
                        div.file-meta {
                            span { (format_date(entry.created_at)) }
                        }
                    }
                }
            } @else if is_image || is_video {
                a.file-with-thumb href=(file_href(&entry.path)) {
                    div.thumbnail-container {
                        div.thumbnail {}
                        @if is_video {
                            div.video-overlay { "▶" }
                        }
                    }
                    (file_info(entry))
                }
            } @else {
                a href=(file_href(&entry.path)) download {
                    div.icon.file {}
                    (file_info(entry))
                }
            }
        }
    }
}

fn file_info(entry: &FileEntry) -> Markup {
    html! {
        div.file-info {
            div.file-name { (entry.name) }
            div.file-meta {
                span { (format_size(entry.size.unwrap_or(0))) }
                span { (format_date(entry.created_at)) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::EntryType;

    fn entry(name: &str, entry_type: EntryType, path: &str) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            entry_type,
            media_kind: MediaKind::from_name(name),
            size: match entry_type {
                EntryType::File => Some(2048),
                EntryType::Directory => None,
            },
            created_at: None,
            updated_at: None,
            path: path.to_string(),
            thumbnail: None,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(500), "500.0 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
        assert_eq!(format_size(2048 * 1024 * 1024 * 1024), "2048.0 GB");
    }

    #[test]
    fn test_format_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 3, 5, 15, 7, 0).unwrap();
        assert_eq!(format_timestamp(&time), "Mar 5, 2024, 03:07 PM");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn test_links_and_display() {
        assert_eq!(file_href("/my%20docs/a%23b%3F.txt"), "/file/my%20docs/a%23b%3F.txt");
        assert_eq!(directory_href("/"), "/");
        assert_eq!(directory_href("/pics"), "/pics/");
        assert_eq!(display_path("/my%20docs/50%25off"), "/my docs/50%off");
        assert_eq!(display_path("/"), "/");
    }

    #[test]
    fn test_directory_page() {
        let listing = ListResponse {
            entries: vec![
                entry("Photos", EntryType::Directory, "/my%20sub/Photos"),
                entry("clip.MP4", EntryType::File, "/my%20sub/clip.MP4"),
                entry(
                    "<b>notes</b>.txt",
                    EntryType::File,
                    "/my%20sub/%3Cb%3Enotes%3C%2Fb%3E.txt",
                ),
            ],
            current_path: "/my%20sub".to_string(),
            parent_path: Some("/".to_string()),
            total: 3,
        };

        let page = directory_page(&listing).into_string();

        assert!(page.contains(r#"href="/my%20sub/Photos/""#));
        assert!(page.contains(r#"data-thumbnail-request-path="/my%20sub/clip.MP4""#));
        assert!(page.contains(r#"data-is-video="true""#));
        assert!(page.contains("video-overlay"));
        assert!(page.contains(r#"href="/file/my%20sub/clip.MP4""#));
        assert!(page.contains("2.0 KB"));
        // 文件名被转义
        assert!(page.contains("&lt;b&gt;notes&lt;/b&gt;.txt"));
        assert!(!page.contains("<b>notes"));
        assert!(page.contains(r#"href="/file/my%20sub/%3Cb%3Enotes%3C%2Fb%3E.txt""#));
        // 当前路径解码后展示
        assert!(page.contains("FinderFI - /my sub"));
        // 非根目录显示 Up 按钮
        assert!(page.contains(">Up<"));
    }

    #[test]
    fn test_root_page_has_no_up_button() {
        let listing = ListResponse {
            entries: Vec::new(),
            current_path: "/".to_string(),
            parent_path: None,
            total: 0,
        };
        let page = directory_page(&listing).into_string();
        assert!(!page.contains(">Up<"));
        assert!(page.contains("This folder is empty"));
    }
}
