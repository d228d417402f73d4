use log::{debug, error, info, warn};

use crate::archive::ArchiveLedger;
use crate::common::types::{Post, RunStats};
use crate::community_tab::{discover, PageProgress};
use crate::error::Result;
use crate::post_writer::{AttachmentResolver, PostWriter};
use crate::youtube_utils::{parse_link, Target, Transport, YoutubeFeed};

/// Per-run switches that change how each post is handled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub reverse: bool,
    pub skip_download: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostOutcome {
    Written,
    Skipped,
    Failed,
}

/// Feed order is newest first; `reverse` gives oldest first.
pub fn order_posts(mut posts: Vec<Post>, reverse: bool) -> Vec<Post> {
    if reverse {
        posts.reverse();
    }
    posts
}

/// Drives links through discovery, writing, media download and the archive.
pub struct Archiver<'a, T: Transport + ?Sized> {
    feed: YoutubeFeed<'a, T>,
    writer: PostWriter,
    resolver: AttachmentResolver<'a, T>,
    ledger: ArchiveLedger,
    options: RunOptions,
}

impl<'a, T: Transport + ?Sized> Archiver<'a, T> {
    pub fn new(
        feed: YoutubeFeed<'a, T>,
        writer: PostWriter,
        resolver: AttachmentResolver<'a, T>,
        ledger: ArchiveLedger,
        options: RunOptions,
    ) -> Self {
        Self {
            feed,
            writer,
            resolver,
            ledger,
            options,
        }
    }

    pub fn ledger(&self) -> &ArchiveLedger {
        &self.ledger
    }

    /// Handle one command line link. Links that match nothing are logged and
    /// ignored; handle resolution and page-structure failures are returned.
    pub fn run_link(
        &mut self,
        link: &str,
        on_page: &mut dyn FnMut(PageProgress),
    ) -> Result<RunStats> {
        match parse_link(link) {
            Some(Target::Post(post_id)) => self.run_post(&post_id),
            Some(Target::ChannelId(channel_id)) => self.run_channel(&channel_id, on_page),
            Some(Target::ChannelHandle(handle)) => {
                let channel_id = self.feed.resolve_handle(&handle)?;
                self.run_channel(&channel_id, on_page)
            }
            None => {
                error!("[ytca] could not parse link/id {}", link);
                Ok(RunStats::default())
            }
        }
    }

    pub fn run_post(&mut self, post_id: &str) -> Result<RunStats> {
        let mut stats = RunStats::default();
        if self.ledger.contains(post_id) {
            info!("[post:{}] already recorded in archive", post_id);
            stats.skipped += 1;
            return Ok(stats);
        }

        let post = match self.feed.fetch_post(post_id) {
            Ok(post) => post,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("[post:{}] {}", post_id, e);
                stats.failed += 1;
                return Ok(stats);
            }
        };

        self.tally(&mut stats, &post);
        Ok(stats)
    }

    pub fn run_channel(
        &mut self,
        channel_id: &str,
        on_page: &mut dyn FnMut(PageProgress),
    ) -> Result<RunStats> {
        let posts = discover(&self.feed, channel_id, on_page)?;
        let stats = self.archive_posts(order_posts(posts, self.options.reverse));
        info!(
            "[ytca] {}: {} written, {} skipped, {} failed",
            channel_id, stats.written, stats.skipped, stats.failed
        );
        Ok(stats)
    }

    /// Per-post failures are counted, never returned.
    pub fn archive_posts(&mut self, posts: Vec<Post>) -> RunStats {
        let mut stats = RunStats::default();
        for post in &posts {
            self.tally(&mut stats, post);
        }
        stats
    }

    fn tally(&mut self, stats: &mut RunStats, post: &Post) {
        match self.archive_post(post) {
            PostOutcome::Written => stats.written += 1,
            PostOutcome::Skipped => stats.skipped += 1,
            PostOutcome::Failed => stats.failed += 1,
        }
    }

    fn archive_post(&mut self, post: &Post) -> PostOutcome {
        let component = format!("post:{}", post.post_id);
        if self.ledger.contains(&post.post_id) {
            info!("[{}] already recorded in archive", component);
            return PostOutcome::Skipped;
        }

        let outcome = if self.options.skip_download {
            debug!("[{}] skip-download set, only recording id", component);
            PostOutcome::Skipped
        } else {
            // write() has already logged the failing path
            if self.writer.write(post).is_err() {
                return PostOutcome::Failed;
            }
            if let Some(attachment) = &post.attachment {
                let prefix = self.writer.media_prefix(&post.post_id);
                let media = self.resolver.resolve(&component, attachment, &prefix);
                debug!("[{}] media: {:?}", component, media);
            }
            PostOutcome::Written
        };

        if let Err(e) = self.ledger.record(&post.post_id) {
            warn!("[{}] could not record in archive: {}", component, e);
        }
        outcome
    }
}
