use log::{debug, info, warn};
use std::collections::HashSet;

use crate::common::types::Post;
use crate::error::Result;

/// One fetched page of a channel's community feed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub continuation: Option<String>,
}

/// Fetches feed pages; `continuation` is `None` for the first page.
pub trait FeedSource {
    fn fetch_page(&self, channel_id: &str, continuation: Option<&str>) -> Result<FeedPage>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub page: usize,
    pub post_count: usize,
}

/// Pagination state for one channel. Posts stay in feed order (newest first),
/// each post id at most once.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ContinuationState {
    pub token: Option<String>,
    pub accumulated_posts: Vec<Post>,
    pages: usize,
    seen_ids: HashSet<String>,
    used_tokens: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue(ContinuationState),
    Done(ContinuationState),
}

impl Step {
    pub fn state(&self) -> &ContinuationState {
        match self {
            Step::Continue(state) | Step::Done(state) => state,
        }
    }
}

impl ContinuationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn progress(&self) -> PageProgress {
        PageProgress {
            page: self.pages,
            post_count: self.accumulated_posts.len(),
        }
    }

    /// Fold a fetched page into the state and decide whether to keep going.
    ///
    /// Posts already collected are dropped. The walk ends when the page has no
    /// continuation token, hands back a token that was already followed, or
    /// adds no new posts.
    pub fn advance(mut self, page: FeedPage) -> Step {
        if let Some(previous) = self.token.take() {
            self.used_tokens.insert(previous);
        }

        let before = self.accumulated_posts.len();
        for post in page.posts {
            if self.seen_ids.insert(post.post_id.clone()) {
                self.accumulated_posts.push(post);
            } else {
                debug!("Post {} already collected, dropping", post.post_id);
            }
        }
        let new_posts = self.accumulated_posts.len() - before;
        self.pages += 1;

        match page.continuation {
            None => Step::Done(self),
            Some(token) if self.used_tokens.contains(&token) => {
                warn!(
                    "[community tab] page {} repeated an earlier continuation token, stopping",
                    self.pages
                );
                Step::Done(self)
            }
            Some(_) if new_posts == 0 => {
                warn!(
                    "[community tab] page {} had no new posts but a continuation token, stopping",
                    self.pages
                );
                Step::Done(self)
            }
            Some(token) => {
                self.token = Some(token);
                Step::Continue(self)
            }
        }
    }
}

/// Walk the whole feed of `channel_id`, reporting each fetched page to `on_page`.
/// A failed page fetch aborts the walk.
pub fn discover<S: FeedSource + ?Sized>(
    source: &S,
    channel_id: &str,
    on_page: &mut dyn FnMut(PageProgress),
) -> Result<Vec<Post>> {
    let mut state = ContinuationState::new();

    loop {
        info!(
            "[community tab] getting posts from community tab (page {})",
            state.pages() + 1
        );
        let page = source.fetch_page(channel_id, state.token.as_deref())?;
        let step = state.advance(page);

        let progress = step.state().progress();
        debug!(
            "Page {} fetched, {} posts so far",
            progress.page, progress.post_count
        );
        on_page(progress);

        match step {
            Step::Continue(next) => state = next,
            Step::Done(done) => {
                info!(
                    "[community tab] found {} posts",
                    done.accumulated_posts.len()
                );
                return Ok(done.accumulated_posts);
            }
        }
    }
}
