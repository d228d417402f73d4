use log::{info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use url::Url;

use crate::common::constants::VIDEO_THUMBNAIL_BASE_URL;
use crate::common::types::{best_thumbnail, Attachment, ImageAttachment, VideoAttachment};
use crate::youtube_utils::{download_media, DownloadOutcome, Transport};

/// Counts of what happened to the media of one post.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MediaStats {
    pub downloaded: usize,
    pub already_present: usize,
    pub failed: usize,
}

fn absolute_url(url: &str) -> String {
    match url.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// `…/abc=s288-c-k` -> `…/abc=s0?imgmax=0`, the original upload size
pub fn full_size_image_url(url: &str) -> String {
    let base = url.split('=').next().unwrap_or(url);
    format!("{}=s0?imgmax=0", absolute_url(base))
}

/// `maxresdefault.jpg` next to a listed video thumbnail
pub fn max_res_video_thumbnail_url(thumbnail_url: &str) -> Option<String> {
    Url::parse(&absolute_url(thumbnail_url))
        .and_then(|url| url.join("maxresdefault.jpg"))
        .map(String::from)
        .ok()
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

pub struct AttachmentResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    video_thumbnail_base: String,
}

impl<'a, T: Transport + ?Sized> AttachmentResolver<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            video_thumbnail_base: VIDEO_THUMBNAIL_BASE_URL.to_string(),
        }
    }

    pub fn with_video_thumbnail_base(mut self, base: &str) -> Self {
        self.video_thumbnail_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Download the media of `attachment` next to `prefix`. Failures are logged
    /// and counted, never returned.
    pub fn resolve(&self, component: &str, attachment: &Attachment, prefix: &Path) -> MediaStats {
        let mut stats = MediaStats::default();
        match attachment {
            Attachment::Gallery(images) => {
                info!("[{}] downloading {} attached images", component, images.len());
                for (i, image) in images.iter().enumerate() {
                    self.resolve_image(component, image, &with_suffix(prefix, &format!("_{}", i)), &mut stats);
                }
            }
            Attachment::Image(image) => self.resolve_image(component, image, prefix, &mut stats),
            Attachment::Video(video) => self.resolve_video(component, video, prefix, &mut stats),
            Attachment::Unknown => {}
        }
        stats
    }

    fn resolve_image(
        &self,
        component: &str,
        image: &ImageAttachment,
        prefix: &Path,
        stats: &mut MediaStats,
    ) {
        let Some(thumbnail) = best_thumbnail(&image.thumbnails) else {
            warn!("[{}] image has no thumbnails, skipping", component);
            stats.failed += 1;
            return;
        };

        info!("[{}] downloading image", component);
        self.fetch(component, &full_size_image_url(&thumbnail.url), prefix, "image", stats);
    }

    fn resolve_video(
        &self,
        component: &str,
        video: &VideoAttachment,
        prefix: &Path,
        stats: &mut MediaStats,
    ) {
        let thumb_url = match (&video.video_id, best_thumbnail(&video.thumbnails)) {
            (Some(video_id), _) => Some(format!(
                "{}/{}/maxresdefault.jpg",
                self.video_thumbnail_base, video_id
            )),
            (None, Some(thumbnail)) => {
                warn!("[{}] could not get video ID, video may be private or deleted", component);
                max_res_video_thumbnail_url(&thumbnail.url)
            }
            (None, None) => None,
        };

        let Some(thumb_url) = thumb_url else {
            warn!("[{}] could not get video thumbnail url for post", component);
            stats.failed += 1;
            return;
        };

        info!("[{}] downloading thumbnail", component);
        self.fetch(component, &thumb_url, &with_suffix(prefix, "_thumb"), "thumbnail", stats);
    }

    fn fetch(&self, component: &str, url: &str, prefix: &Path, what: &str, stats: &mut MediaStats) {
        match download_media(self.transport, url, prefix) {
            Ok(DownloadOutcome::Downloaded { .. }) => stats.downloaded += 1,
            Ok(DownloadOutcome::AlreadyPresent(path)) => {
                info!(
                    "[{}] {} already downloaded ({}), skipping",
                    component,
                    what,
                    path.display()
                );
                stats.already_present += 1;
            }
            Err(e) => {
                warn!("[{}] failed to download {} from {}: {}", component, what, url, e);
                stats.failed += 1;
            }
        }
    }
}
