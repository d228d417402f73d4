//! Archive YouTube community posts as JSON files, along with their images
//! and video thumbnails.

pub mod archive;
pub mod cli_args;
pub mod common;
pub mod community_tab;
pub mod error;
pub mod post_writer;
pub mod runner;
pub mod settings;
pub mod youtube_utils;

pub use archive::ArchiveLedger;
pub use common::*;
pub use community_tab::{discover, ContinuationState, FeedPage, FeedSource, PageProgress, Step};
pub use error::{Error, Result};
pub use post_writer::{AttachmentResolver, MediaStats, PostWriter, WriteError};
pub use runner::{order_posts, Archiver, RunOptions};
pub use youtube_utils::*;
