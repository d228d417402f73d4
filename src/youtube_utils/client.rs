use log::{debug, error};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use serde_json::Value;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use super::cookies::{build_cookie_jar, CookieSource};
use crate::common::constants::YOUTUBE_BASE_URL;
use crate::error::{Error, Result};
use crate::settings::HttpSettings;

/// A streamed response body plus its declared media type.
pub struct MediaResponse {
    pub content_type: Option<String>,
    pub body: Box<dyn Read>,
}

/// Blocking page and media fetches. Any non-2xx response is an error.
pub trait Transport {
    fn get_text(&self, url: &str) -> Result<String>;

    fn post_json(&self, url: &str, body: &Value) -> Result<Value>;

    fn get_media(&self, url: &str) -> Result<MediaResponse>;
}

pub struct YoutubeClient {
    client: Client,
    base_url: String,
    client_version: String,
}

impl YoutubeClient {
    pub fn new(http: &HttpSettings, cookies: &CookieSource) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&http.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(http.http_timeout_secs))
            .user_agent(http.user_agent.clone())
            .default_headers(headers)
            .cookie_provider(Arc::new(build_cookie_jar(cookies)))
            .build()?;

        Ok(Self {
            client,
            base_url: YOUTUBE_BASE_URL.to_string(),
            client_version: http.client_version.clone(),
        })
    }

    /// Point page requests somewhere other than youtube.com
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_version(&self) -> &str {
        &self.client_version
    }

    fn check_status(url: &str, response: &reqwest::blocking::Response) -> Result<()> {
        debug!("Received response with status: {}", response.status());
        if !response.status().is_success() {
            error!("HTTP request to {} failed with status: {}", url, response.status());
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

impl Transport for YoutubeClient {
    fn get_text(&self, url: &str) -> Result<String> {
        debug!("Fetching page: {}", url);
        let response = self.client.get(url).send()?;
        Self::check_status(url, &response)?;
        Ok(response.text()?)
    }

    fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!("Posting continuation request to: {}", url);
        let response = self
            .client
            .post(url)
            .header("X-YouTube-Client-Name", "1")
            .header("X-YouTube-Client-Version", self.client_version.as_str())
            .header(REFERER, self.base_url.as_str())
            .json(body)
            .send()?;
        Self::check_status(url, &response)?;
        Ok(response.json()?)
    }

    fn get_media(&self, url: &str) -> Result<MediaResponse> {
        debug!("Requesting media: {}", url);
        let response = self.client.get(url).send()?;
        Self::check_status(url, &response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Ok(MediaResponse {
            content_type,
            body: Box::new(response),
        })
    }
}
