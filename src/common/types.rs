use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use super::constants::ORIGINAL_POST_KEY;
use crate::error::{Error, Result};

static POST_ID_RE: OnceLock<Regex> = OnceLock::new();

pub fn is_valid_post_id(post_id: &str) -> bool {
    POST_ID_RE
        .get_or_init(|| Regex::new(r"^Ug[A-Za-z0-9_-]+$").expect("post id regex is valid"))
        .is_match(post_id)
}

/// A single community post, possibly reposting another one.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub post_id: String,
    pub published_string: String,
    pub original_post: Option<Box<Post>>,
    pub attachment: Option<Attachment>,
    /// Every other normalized field, written out as-is
    pub raw_fields: Map<String, Value>,
}

impl Post {
    pub fn new(post_id: impl Into<String>, published_string: impl Into<String>) -> Result<Self> {
        let post_id = post_id.into();
        if !is_valid_post_id(&post_id) {
            return Err(Error::InvalidArgument(format!(
                "'{}' is not a community post id",
                post_id
            )));
        }

        Ok(Self {
            post_id,
            published_string: published_string.into(),
            original_post: None,
            attachment: None,
            raw_fields: Map::new(),
        })
    }

    pub fn with_original(mut self, original: Post) -> Self {
        self.original_post = Some(Box::new(original));
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.raw_fields.insert(key.to_string(), value.into());
        self
    }

    pub fn as_json(&self) -> Value {
        self.as_json_with(&|_, _| {})
    }

    /// Serialize the post, nesting the original post under `original_post`.
    /// `augment` runs on every level of the chain after its fields are set.
    pub fn as_json_with(&self, augment: &dyn Fn(&Post, &mut Map<String, Value>)) -> Value {
        let mut obj = self.raw_fields.clone();
        obj.insert("post_id".to_string(), Value::from(self.post_id.as_str()));

        if let Some(original) = &self.original_post {
            obj.insert(
                ORIGINAL_POST_KEY.to_string(),
                original.as_json_with(augment),
            );
        }

        augment(self, &mut obj);
        Value::Object(obj)
    }

    /// Number of posts in the repost chain starting at this one
    pub fn chain_len(&self) -> usize {
        1 + self.original_post.as_ref().map_or(0, |p| p.chain_len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
}

impl Thumbnail {
    fn area(&self) -> u64 {
        self.width.unwrap_or(0) * self.height.unwrap_or(0)
    }
}

/// Largest declared thumbnail; on ties (or no sizes at all) the last listed wins.
pub fn best_thumbnail(thumbnails: &[Thumbnail]) -> Option<&Thumbnail> {
    thumbnails.iter().max_by_key(|t| t.area())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAttachment {
    pub video_id: Option<String>,
    pub thumbnails: Vec<Thumbnail>,
}

/// Media attached to a post, decided once from the page data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Gallery(Vec<ImageAttachment>),
    Image(ImageAttachment),
    Video(VideoAttachment),
    /// Polls, quizzes, links: nothing to download
    Unknown,
}

impl Attachment {
    pub fn from_json(attachment: &Value) -> Self {
        if let Some(gallery) = attachment.get("postMultiImageRenderer") {
            let images = gallery["images"]
                .as_array()
                .map(|images| images.iter().filter_map(image_from_json).collect())
                .unwrap_or_default();
            Attachment::Gallery(images)
        } else if let Some(image) = image_from_json(attachment) {
            Attachment::Image(image)
        } else if let Some(video) = attachment.get("videoRenderer") {
            Attachment::Video(VideoAttachment {
                video_id: video["videoId"].as_str().map(String::from),
                thumbnails: thumbnails_from_json(&video["thumbnail"]["thumbnails"]),
            })
        } else {
            Attachment::Unknown
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Attachment::Gallery(_) => "gallery",
            Attachment::Image(_) => "image",
            Attachment::Video(_) => "video",
            Attachment::Unknown => "unknown",
        }
    }
}

fn image_from_json(value: &Value) -> Option<ImageAttachment> {
    let renderer = value.get("backstageImageRenderer")?;
    Some(ImageAttachment {
        thumbnails: thumbnails_from_json(&renderer["image"]["thumbnails"]),
    })
}

fn thumbnails_from_json(value: &Value) -> Vec<Thumbnail> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|t| serde_json::from_value(t.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Processing statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn total(&self) -> usize {
        self.written + self.skipped + self.failed
    }

    pub fn merge(&mut self, other: RunStats) {
        self.written += other.written;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}
