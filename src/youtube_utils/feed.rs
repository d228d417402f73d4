use log::{debug, error, info};
use serde_json::json;

use super::client::Transport;
use super::page_data::{
    community_tab_items, continuation_items, extract_initial_data, find_channel_id,
    parse_feed_items, post_from_initial_data,
};
use crate::common::constants::YOUTUBE_BROWSE_PATH;
use crate::common::types::Post;
use crate::community_tab::{FeedPage, FeedSource};
use crate::error::{Error, Result};

/// Community feed pages, single posts and handle lookups for one site.
pub struct YoutubeFeed<'a, T: Transport + ?Sized> {
    transport: &'a T,
    base_url: String,
    client_version: String,
}

impl<'a, T: Transport + ?Sized> YoutubeFeed<'a, T> {
    pub fn new(transport: &'a T, base_url: &str, client_version: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_version: client_version.to_string(),
        }
    }

    pub fn resolve_handle(&self, handle: &str) -> Result<String> {
        let handle_url = format!("{}/{}", self.base_url, handle);
        let page = self.transport.get_text(&handle_url).map_err(|e| {
            error!(
                "[ytca] failed to convert channel handle to channel id, no response from {}",
                handle_url
            );
            e
        })?;

        let channel_id = find_channel_id(&page).ok_or_else(|| {
            error!("[ytca] failed to convert channel handle to channel id, data format may have changed");
            Error::PageFormat(format!("no channel id found for {}", handle))
        })?;

        info!("[ytca] resolved {} to {}", handle, channel_id);
        Ok(channel_id)
    }

    pub fn fetch_post(&self, post_id: &str) -> Result<Post> {
        let url = format!("{}/post/{}", self.base_url, post_id);
        let page = self.transport.get_text(&url)?;
        let initial_data = extract_initial_data(&page)?;
        post_from_initial_data(&initial_data)
    }

    fn first_page(&self, channel_id: &str) -> Result<FeedPage> {
        let url = format!("{}/channel/{}/community", self.base_url, channel_id);
        let page = self.transport.get_text(&url)?;
        let initial_data = extract_initial_data(&page)?;
        Ok(parse_feed_items(community_tab_items(&initial_data)?))
    }

    fn next_page(&self, token: &str) -> Result<FeedPage> {
        let url = format!("{}{}", self.base_url, YOUTUBE_BROWSE_PATH);
        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB",
                    "clientVersion": self.client_version,
                    "hl": "en",
                    "gl": "US",
                }
            },
            "continuation": token,
        });
        let response = self.transport.post_json(&url, &body)?;
        Ok(parse_feed_items(continuation_items(&response)?))
    }
}

impl<T: Transport + ?Sized> FeedSource for YoutubeFeed<'_, T> {
    fn fetch_page(&self, channel_id: &str, continuation: Option<&str>) -> Result<FeedPage> {
        let page = match continuation {
            None => self.first_page(channel_id)?,
            Some(token) => self.next_page(token)?,
        };
        debug!(
            "Feed page for {}: {} posts, continuation: {}",
            channel_id,
            page.posts.len(),
            page.continuation.is_some()
        );
        Ok(page)
    }
}
