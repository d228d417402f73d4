use log::{debug, warn};
use regex::Regex;
use serde_json::{Deserializer, Map, Value};
use std::sync::OnceLock;

use crate::common::types::{Attachment, Post};
use crate::community_tab::FeedPage;
use crate::error::{Error, Result};

const INITIAL_DATA_MARKER: &str = "ytInitialData";

static CHANNEL_ID_RES: OnceLock<Vec<Regex>> = OnceLock::new();

fn channel_id_regexes() -> &'static [Regex] {
    CHANNEL_ID_RES.get_or_init(|| {
        [
            r#""header":\{"c4TabbedHeaderRenderer":\{"channelId":"(?P<channel_id>UC[a-zA-Z0-9_-]+)""#,
            r#""externalId":"(?P<channel_id>UC[a-zA-Z0-9_-]+)""#,
            r#"<meta itemprop="identifier" content="(?P<channel_id>UC[a-zA-Z0-9_-]+)">"#,
            r#"<link rel="canonical" href="https://www\.youtube\.com/channel/(?P<channel_id>UC[a-zA-Z0-9_-]+)">"#,
        ]
        .iter()
        .map(|re| Regex::new(re).unwrap())
        .collect()
    })
}

/// Channel id embedded in a channel home page, if any of the known spots has one.
pub fn find_channel_id(html: &str) -> Option<String> {
    channel_id_regexes()
        .iter()
        .find_map(|re| re.captures(html))
        .map(|caps| caps["channel_id"].to_string())
}

/// The `ytInitialData` object assigned in one of the page's inline scripts.
pub fn extract_initial_data(html: &str) -> Result<Value> {
    let mut search_from = 0;
    while let Some(found) = html[search_from..].find(INITIAL_DATA_MARKER) {
        let after_marker = search_from + found + INITIAL_DATA_MARKER.len();
        search_from = after_marker;

        let rest = html[after_marker..].trim_start_matches(|c: char| c == '"' || c == ']');
        let Some(rest) = rest.trim_start().strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        if !rest.starts_with('{') {
            continue;
        }

        let mut values = Deserializer::from_str(rest).into_iter::<Value>();
        if let Some(Ok(value)) = values.next() {
            debug!("Found initial data ({} top-level keys)", value.as_object().map_or(0, |o| o.len()));
            return Ok(value);
        }
    }

    Err(Error::PageFormat(
        "ytInitialData not found in page".to_string(),
    ))
}

/// Depth-first search for the first value stored under `key`.
pub fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|v| find_key(v, key))),
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// Plain text of a `{simpleText}` or `{runs: [{text}]}` node.
pub fn text_of(value: &Value) -> Option<String> {
    if let Some(text) = value["simpleText"].as_str() {
        return Some(text.to_string());
    }
    let runs = value["runs"].as_array()?;
    Some(runs.iter().filter_map(|r| r["text"].as_str()).collect())
}

/// Items of the community (posts) tab of a channel page.
pub fn community_tab_items(initial_data: &Value) -> Result<&[Value]> {
    let tabs = initial_data
        .pointer("/contents/twoColumnBrowseResultsRenderer/tabs")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::PageFormat("channel page has no tabs".to_string()))?;

    let is_community_tab = |tab: &Value| {
        let renderer = &tab["tabRenderer"];
        let url = renderer
            .pointer("/endpoint/commandMetadata/webCommandMetadata/url")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let title = renderer["title"].as_str().unwrap_or_default();
        url.ends_with("/community")
            || url.ends_with("/posts")
            || title == "Community"
            || title == "Posts"
    };

    let tab = tabs
        .iter()
        .find(|tab| is_community_tab(tab))
        .or_else(|| {
            tabs.iter().find(|tab| {
                tab["tabRenderer"]["selected"].as_bool() == Some(true)
                    && tab["tabRenderer"].get("content").is_some()
            })
        })
        .ok_or_else(|| Error::PageFormat("community tab not found".to_string()))?;

    tab.pointer("/tabRenderer/content/sectionListRenderer/contents/0/itemSectionRenderer/contents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| Error::PageFormat("community tab has no item section".to_string()))
}

/// Items appended by a continuation (`browse`) response.
pub fn continuation_items(response: &Value) -> Result<&[Value]> {
    response["onResponseReceivedEndpoints"]
        .as_array()
        .into_iter()
        .flatten()
        .find_map(|endpoint| {
            endpoint
                .pointer("/appendContinuationItemsAction/continuationItems")
                .or_else(|| endpoint.pointer("/reloadContinuationItemsCommand/continuationItems"))
                .and_then(Value::as_array)
        })
        .map(Vec::as_slice)
        .ok_or_else(|| Error::PageFormat("continuation response has no items".to_string()))
}

/// Posts and the next continuation token found in a list of feed items.
pub fn parse_feed_items(items: &[Value]) -> FeedPage {
    let mut page = FeedPage::default();

    for item in items {
        if let Some(post) = item.pointer("/backstagePostThreadRenderer/post") {
            match parse_post(post) {
                Ok(post) => page.posts.push(post),
                Err(e) => warn!("[community tab] skipping unreadable post: {}", e),
            }
        } else if let Some(token) = item
            .pointer("/continuationItemRenderer/continuationEndpoint/continuationCommand/token")
            .and_then(Value::as_str)
        {
            page.continuation = Some(token.to_string());
        }
    }

    page
}

/// The post shown on a single post page.
pub fn post_from_initial_data(initial_data: &Value) -> Result<Post> {
    let post = find_key(initial_data, "backstagePostThreadRenderer")
        .and_then(|thread| thread.get("post"))
        .ok_or_else(|| Error::PageFormat("post page has no post".to_string()))?;
    parse_post(post)
}

/// Normalize a `{backstagePostRenderer}` or `{sharedPostRenderer}` node.
pub fn parse_post(post: &Value) -> Result<Post> {
    if let Some(renderer) = post.get("backstagePostRenderer") {
        parse_backstage_post(renderer)
    } else if let Some(renderer) = post.get("sharedPostRenderer") {
        parse_shared_post(renderer)
    } else {
        Err(Error::PageFormat(
            "post is neither a backstage nor a shared post".to_string(),
        ))
    }
}

fn post_id_of(renderer: &Value) -> Result<&str> {
    renderer["postId"]
        .as_str()
        .ok_or_else(|| Error::PageFormat("post without postId".to_string()))
}

fn parse_backstage_post(renderer: &Value) -> Result<Post> {
    let published = text_of(&renderer["publishedTimeText"]).unwrap_or_default();
    let mut post = Post::new(post_id_of(renderer)?, published)?;

    post.raw_fields = common_fields(
        renderer,
        &renderer["authorText"],
        &renderer["authorEndpoint"],
        &renderer["contentText"],
    );
    post.raw_fields.insert(
        "vote_count".to_string(),
        text_of(&renderer["voteCount"]).map_or(Value::Null, Value::from),
    );

    let attachment = renderer.get("backstageAttachment");
    post.raw_fields.insert(
        "backstage_attachment".to_string(),
        attachment.cloned().unwrap_or(Value::Null),
    );
    post.attachment = attachment.map(Attachment::from_json);

    Ok(post)
}

fn parse_shared_post(renderer: &Value) -> Result<Post> {
    let published = text_of(&renderer["publishedTimeText"]).unwrap_or_default();
    let mut post = Post::new(post_id_of(renderer)?, published)?;

    post.raw_fields = common_fields(
        renderer,
        &renderer["displayName"],
        &renderer["endpoint"],
        &renderer["content"],
    );
    post.raw_fields
        .insert("backstage_attachment".to_string(), Value::Null);

    if let Some(original) = renderer.get("originalPost") {
        match parse_post(original) {
            Ok(original) => post.original_post = Some(Box::new(original)),
            Err(e) => warn!(
                "[post:{}] original post unavailable: {}",
                post.post_id, e
            ),
        }
    }

    Ok(post)
}

fn common_fields(
    renderer: &Value,
    author: &Value,
    author_endpoint: &Value,
    content: &Value,
) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        "channel_id".to_string(),
        author_endpoint["browseEndpoint"]["browseId"]
            .as_str()
            .map_or(Value::Null, Value::from),
    );
    fields.insert(
        "channel_name".to_string(),
        text_of(author).map_or(Value::Null, Value::from),
    );
    fields.insert(
        "content_text".to_string(),
        text_of(content).map_or(Value::Null, Value::from),
    );
    if let Some(poll) = renderer.pointer("/backstageAttachment/pollRenderer") {
        fields.insert("poll".to_string(), poll.clone());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backstage(post_id: &str) -> Value {
        json!({
            "backstagePostRenderer": {
                "postId": post_id,
                "authorText": {"runs": [{"text": "Some Creator"}]},
                "authorEndpoint": {"browseEndpoint": {"browseId": "UCcreator"}},
                "contentText": {"runs": [{"text": "hello "}, {"text": "world"}]},
                "publishedTimeText": {"runs": [{"text": "3 days ago"}]},
                "voteCount": {"simpleText": "1.2K"},
                "backstageAttachment": {
                    "backstageImageRenderer": {"image": {"thumbnails": [
                        {"url": "https://yt3.ggpht.com/abc=s288", "width": 288, "height": 288}
                    ]}}
                }
            }
        })
    }

    #[test]
    fn test_extract_initial_data() {
        let html = r#"<html><script>var ytInitialData = {"a": {"b": "};</script>"}, "c": [1, 2]};</script><script>other()</script></html>"#;
        let data = extract_initial_data(html).unwrap();
        assert_eq!(data["a"]["b"], "};</script>");
        assert_eq!(data["c"][1], 2);
    }

    #[test]
    fn test_extract_initial_data_window_form() {
        let html = r#"<script>window["ytInitialData"] = {"x": 1};</script>"#;
        assert_eq!(extract_initial_data(html).unwrap()["x"], 1);
    }

    #[test]
    fn test_extract_initial_data_missing() {
        let err = extract_initial_data("<html>consent page</html>").unwrap_err();
        assert!(matches!(err, Error::PageFormat(_)));
        assert!(extract_initial_data("ytInitialData is mentioned but never set").is_err());
    }

    #[test]
    fn test_parse_backstage_post() {
        let post = parse_post(&backstage("UgkxFirst")).unwrap();
        assert_eq!(post.post_id, "UgkxFirst");
        assert_eq!(post.published_string, "3 days ago");
        assert_eq!(post.raw_fields["content_text"], "hello world");
        assert_eq!(post.raw_fields["channel_id"], "UCcreator");
        assert_eq!(post.raw_fields["vote_count"], "1.2K");
        assert!(matches!(post.attachment, Some(Attachment::Image(_))));
        assert!(post.original_post.is_none());
    }

    #[test]
    fn test_parse_shared_post_recurses() {
        let shared = json!({
            "sharedPostRenderer": {
                "postId": "UgkxShare",
                "displayName": {"runs": [{"text": "Reposter"}]},
                "content": {"runs": [{"text": "look at this"}]},
                "publishedTimeText": {"runs": [{"text": "1 hour ago"}]},
                "originalPost": backstage("UgkxOrig")
            }
        });
        let post = parse_post(&shared).unwrap();
        assert_eq!(post.post_id, "UgkxShare");
        assert_eq!(post.raw_fields["channel_name"], "Reposter");
        assert_eq!(post.original_post.as_ref().unwrap().post_id, "UgkxOrig");
        assert!(post.attachment.is_none());
    }

    #[test]
    fn test_parse_feed_items_with_continuation() {
        let items = vec![
            json!({"backstagePostThreadRenderer": {"post": backstage("UgkxA")}}),
            json!({"backstagePostThreadRenderer": {"post": {"unknownRenderer": {}}}}),
            json!({"backstagePostThreadRenderer": {"post": backstage("UgkxB")}}),
            json!({"continuationItemRenderer": {"continuationEndpoint": {"continuationCommand": {"token": "next-page"}}}}),
        ];
        let page = parse_feed_items(&items);
        let ids: Vec<_> = page.posts.iter().map(|p| p.post_id.as_str()).collect();
        assert_eq!(ids, vec!["UgkxA", "UgkxB"]);
        assert_eq!(page.continuation.as_deref(), Some("next-page"));
    }

    #[test]
    fn test_community_tab_items() {
        let data = json!({
            "contents": {"twoColumnBrowseResultsRenderer": {"tabs": [
                {"tabRenderer": {"title": "Home", "endpoint": {"commandMetadata": {"webCommandMetadata": {"url": "/@x/featured"}}}}},
                {"tabRenderer": {
                    "title": "Posts",
                    "endpoint": {"commandMetadata": {"webCommandMetadata": {"url": "/@x/posts"}}},
                    "content": {"sectionListRenderer": {"contents": [{"itemSectionRenderer": {"contents": [
                        {"backstagePostThreadRenderer": {"post": backstage("UgkxA")}}
                    ]}}]}}
                }}
            ]}}
        });
        assert_eq!(community_tab_items(&data).unwrap().len(), 1);
        assert!(community_tab_items(&json!({"contents": {}})).is_err());
    }

    #[test]
    fn test_continuation_items() {
        let response = json!({"onResponseReceivedEndpoints": [
            {"appendContinuationItemsAction": {"continuationItems": [{"a": 1}, {"b": 2}]}}
        ]});
        assert_eq!(continuation_items(&response).unwrap().len(), 2);
        assert!(continuation_items(&json!({})).is_err());
    }

    #[test]
    fn test_post_from_initial_data() {
        let data = json!({"contents": {"twoColumnBrowseResultsRenderer": {"tabs": [{"tabRenderer": {"content":
            {"sectionListRenderer": {"contents": [{"itemSectionRenderer": {"contents": [
                {"backstagePostThreadRenderer": {"post": backstage("UgkxSingle")}}
            ]}}]}}}}]}}});
        assert_eq!(post_from_initial_data(&data).unwrap().post_id, "UgkxSingle");
        assert!(post_from_initial_data(&json!({})).is_err());
    }

    #[test]
    fn test_find_channel_id() {
        let html = r#"..."header":{"c4TabbedHeaderRenderer":{"channelId":"UCabc-123","title":"x"}..."#;
        assert_eq!(find_channel_id(html).as_deref(), Some("UCabc-123"));
        let html = r#"<meta itemprop="identifier" content="UCzzz">"#;
        assert_eq!(find_channel_id(html).as_deref(), Some("UCzzz"));
        assert_eq!(find_channel_id("<html></html>"), None);
    }
}
