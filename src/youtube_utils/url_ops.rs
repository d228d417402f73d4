use regex::Regex;
use std::sync::OnceLock;

/// What a command line link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Post(String),
    ChannelId(String),
    ChannelHandle(String),
}

static POST_RE: OnceLock<Regex> = OnceLock::new();
static CHANNEL_RE: OnceLock<Regex> = OnceLock::new();

fn post_regex() -> &'static Regex {
    POST_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?:https?://)?(?:.*?\.)?(?:youtube\.com/)(?:(?:channel/UC[a-zA-Z0-9_-]+/community\?lb=)|post/))?(?P<post_id>Ug[a-zA-Z0-9_-]+)(?:[/?#&].*)?$",
        )
        .unwrap()
    })
}

fn channel_regex() -> &'static Regex {
    CHANNEL_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?:https?://)?(?:.*?\.)?(?:youtube\.com/))?(?:(?P<channel_handle>@[a-zA-Z0-9_.-]+)|(?:(?:channel/)?(?P<channel_id>UC[a-zA-Z0-9_-]+)))(?:/.*)?$",
        )
        .unwrap()
    })
}

/// Trim whitespace and drop share-tracking query strings, keeping `?lb=` post links.
pub fn clean_link(link: &str) -> String {
    let trimmed = link.trim();
    match trimmed.find('?') {
        Some(pos) if !trimmed[pos..].contains("lb=") => trimmed[..pos].to_string(),
        _ => trimmed.to_string(),
    }
}

/// Post patterns are tried before channel patterns.
pub fn parse_link(link: &str) -> Option<Target> {
    let link = clean_link(link);
    if link.is_empty() {
        return None;
    }

    if let Some(caps) = post_regex().captures(&link) {
        return Some(Target::Post(caps["post_id"].to_string()));
    }

    let caps = channel_regex().captures(&link)?;
    if let Some(handle) = caps.name("channel_handle") {
        Some(Target::ChannelHandle(handle.as_str().to_string()))
    } else {
        caps.name("channel_id")
            .map(|id| Target::ChannelId(id.as_str().to_string()))
    }
}
