/// Default timeout for HTTP requests in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// User agent string for HTTP requests
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Relative-time strings are only parseable in English
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Innertube web client version sent with continuation requests
pub const CLIENT_VERSION: &str = "2.20240101.00.00";

/// Base URLs for YouTube
pub const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";
pub const YOUTUBE_BROWSE_PATH: &str = "/youtubei/v1/browse?prettyPrint=false";
pub const VIDEO_THUMBNAIL_BASE_URL: &str = "https://i.ytimg.com/vi";

/// Cookie domain used for the default consent cookies
pub const COOKIE_DOMAIN: &str = ".youtube.com";
pub const DEFAULT_CONSENT_COOKIES: &[(&str, &str)] = &[
    (
        "SOCS",
        "CAESNQgDEitib3FfaWRlbnRpdHlmcm9udGVuZHVpc2VydmVyXzIwMjIwNzA1LjE2X3AwGgJwdCACGgYIgOedlgY",
    ),
    ("CONSENT", "PENDING+917"),
];

/// Fixed read buffer for streamed media downloads
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

/// File extensions
pub const JSON_EXT: &str = "json";
pub const TEMP_SUFFIX: &str = "tmp";
/// Extensions next to media that are not media themselves
pub const NON_MEDIA_EXTS: &[&str] = &[JSON_EXT, TEMP_SUFFIX];

/// Key holding the serialized original post of a repost
pub const ORIGINAL_POST_KEY: &str = "original_post";

/// Key holding timestamp metadata when date tracking is enabled
pub const PUBLISHED_KEY: &str = "_published";

/// Spinner template for pagination progress
pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";
