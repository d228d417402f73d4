use log::{debug, info, warn};
use reqwest::cookie::Jar;
use reqwest::Url;
use std::fs;
use std::path::PathBuf;

use crate::common::constants::{COOKIE_DOMAIN, DEFAULT_CONSENT_COOKIES};
use crate::common::time_utils::current_unix_timestamp;
use crate::error::{Error, Result};

/// Where the HTTP client gets its cookies from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CookieSource {
    /// Fixed consent cookies so the consent interstitial is skipped
    #[default]
    Defaults,
    /// A Netscape format cookie file, e.g. exported from a browser
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetscapeCookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Unix seconds, 0 for session cookies
    pub expires: i64,
    pub name: String,
    pub value: String,
}

impl NetscapeCookie {
    fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }

    fn set_cookie_string(&self) -> String {
        let mut cookie = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.include_subdomains {
            cookie.push_str(&format!("; Domain={}", self.host()));
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn origin(&self) -> Option<Url> {
        Url::parse(&format!("https://{}{}", self.host(), self.path)).ok()
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires != 0 && self.expires < now
    }
}

pub fn parse_netscape_cookies(contents: &str) -> Result<Vec<NetscapeCookie>> {
    let mut cookies = Vec::new();

    for (line_no, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.trim().is_empty() || line.starts_with('#') => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 {
            return Err(Error::InvalidArgument(format!(
                "malformed cookie on line {}: expected 7 tab-separated fields, found {}",
                line_no + 1,
                fields.len()
            )));
        }

        let expires = fields[4].trim().parse::<i64>().map_err(|_| {
            Error::InvalidArgument(format!(
                "malformed cookie on line {}: bad expiry '{}'",
                line_no + 1,
                fields[4]
            ))
        })?;

        cookies.push(NetscapeCookie {
            domain: fields[0].to_string(),
            include_subdomains: fields[1].eq_ignore_ascii_case("TRUE"),
            path: fields[2].to_string(),
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            expires,
            name: fields[5].to_string(),
            value: fields[6].to_string(),
        });
    }

    Ok(cookies)
}

pub fn build_cookie_jar(source: &CookieSource) -> Jar {
    match source {
        CookieSource::Defaults => default_jar(),
        CookieSource::File(path) => {
            let contents = match fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(
                        "[ytca] could not find cookies file {}, continuing without cookies...",
                        path.display()
                    );
                    return default_jar();
                }
                Err(e) => {
                    warn!("[ytca] {}", e);
                    warn!(
                        "[ytca] failed to load cookies from {}, continuing without cookies",
                        path.display()
                    );
                    return default_jar();
                }
            };

            match parse_netscape_cookies(&contents) {
                Ok(cookies) => {
                    let jar = Jar::default();
                    let now = current_unix_timestamp();
                    let mut loaded = 0;
                    for cookie in cookies.iter().filter(|c| !c.is_expired(now)) {
                        if let Some(origin) = cookie.origin() {
                            jar.add_cookie_str(&cookie.set_cookie_string(), &origin);
                            loaded += 1;
                        } else {
                            debug!("Skipping cookie {} for domain {}", cookie.name, cookie.domain);
                        }
                    }
                    info!("[ytca] loaded {} cookies from {}", loaded, path.display());
                    jar
                }
                Err(e) => {
                    warn!("[ytca] {}", e);
                    warn!(
                        "[ytca] failed to load cookies from {}, continuing without cookies",
                        path.display()
                    );
                    default_jar()
                }
            }
        }
    }
}

fn default_jar() -> Jar {
    let jar = Jar::default();
    let host = COOKIE_DOMAIN.trim_start_matches('.');
    if let Ok(origin) = Url::parse(&format!("https://www.{}/", host)) {
        for (name, value) in DEFAULT_CONSENT_COOKIES {
            jar.add_cookie_str(
                &format!("{}={}; Domain={}; Path=/", name, value, host),
                &origin,
            );
        }
    }
    jar
}
