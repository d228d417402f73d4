mod client;
mod cookies;
mod feed;
mod file_ops;
mod media;
pub mod page_data;
mod url_ops;

pub use client::{MediaResponse, Transport, YoutubeClient};
pub use cookies::{build_cookie_jar, parse_netscape_cookies, CookieSource, NetscapeCookie};
pub use feed::YoutubeFeed;
pub use file_ops::{ensure_dir_exists, temp_path_for, write_atomic, write_atomic_from_reader};
pub use media::{download_media, existing_media, extension_from_content_type, path_with_ext, DownloadOutcome};
pub use url_ops::{clean_link, parse_link, Target};
