pub mod constants;
pub mod time_utils;
pub mod types;

pub use time_utils::{estimate_time_diff, TimeEstimate, TimestampEstimate};
pub use types::{
    best_thumbnail, is_valid_post_id, Attachment, ImageAttachment, Post, RunStats, Thumbnail,
    VideoAttachment,
};
