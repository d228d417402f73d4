use log::{error, info};
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

mod attachment_handler;

pub use attachment_handler::{
    full_size_image_url, max_res_video_thumbnail_url, AttachmentResolver, MediaStats,
};

use crate::common::constants::{JSON_EXT, PUBLISHED_KEY};
use crate::common::time_utils::{current_unix_timestamp, TimestampEstimate};
use crate::common::types::Post;
use crate::youtube_utils::{ensure_dir_exists, write_atomic};

#[derive(Debug, Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Persists posts as `{output_dir}/{post_id}.json`.
pub struct PostWriter {
    output_dir: PathBuf,
    track_dates: bool,
    clock: fn() -> i64,
}

impl PostWriter {
    pub fn new(output_dir: impl Into<PathBuf>, track_dates: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            track_dates,
            clock: current_unix_timestamp,
        }
    }

    /// Replace the clock used for `_published.lastUpdatedTimestamp`
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn post_path(&self, post_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", post_id, JSON_EXT))
    }

    /// Path prefix media of a post is saved under, before suffix and extension
    pub fn media_prefix(&self, post_id: &str) -> PathBuf {
        self.output_dir.join(post_id)
    }

    pub fn render(&self, post: &Post) -> Value {
        let captured_at = self.track_dates.then(|| (self.clock)());
        post.as_json_with(&|p, obj| {
            if let Some(captured_at) = captured_at {
                let published = TimestampEstimate::at(captured_at, &p.published_string);
                obj.insert(
                    PUBLISHED_KEY.to_string(),
                    serde_json::to_value(published).unwrap_or(Value::Null),
                );
            }
        })
    }

    /// Write `post` and, first, every post it reposts. Each lands in its own
    /// file. Every write in the chain is attempted; a failure anywhere fails
    /// the whole call.
    pub fn write(&self, post: &Post) -> Result<(), WriteError> {
        let ancestor = match &post.original_post {
            Some(original) => self.write(original),
            None => Ok(()),
        };

        let component = format!("post:{}", post.post_id);
        let path = self.post_path(&post.post_id);
        info!("[{}] writing {}.{}", component, post.post_id, JSON_EXT);

        if let Err(source) = self.write_json(post, &path) {
            error!("[{}] failed to write file {}", component, path.display());
            error!("[{}] {}", component, source);
            return Err(WriteError { path, source });
        }

        ancestor
    }

    fn write_json(&self, post: &Post, path: &Path) -> io::Result<()> {
        ensure_dir_exists(&self.output_dir)?;
        let contents = serde_json::to_vec(&self.render(post))?;
        write_atomic(path, &contents)
    }
}
