use log::{debug, info};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::client::Transport;
use super::file_ops::write_atomic_from_reader;
use crate::common::constants::NON_MEDIA_EXTS;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    AlreadyPresent(PathBuf),
}

/// `image/jpeg` -> `jpg`, `image/png; q=1` -> `png`
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    let subtype = subtype.trim().to_ascii_lowercase();
    if subtype.is_empty() {
        return None;
    }
    Some(subtype.replace("jpeg", "jpg"))
}

pub fn path_with_ext(prefix: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// An already downloaded `{prefix}.{ext}`, whatever the extension. Post JSON
/// and temp files don't count.
pub fn existing_media(prefix: &Path) -> Option<PathBuf> {
    let stem = prefix.file_name()?.to_str()?;
    let dir = match prefix.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list {:?} ({}), assuming no media", dir, e);
            return None;
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_prefix(stem))
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|ext| {
                    !ext.is_empty() && !ext.contains('.') && !NON_MEDIA_EXTS.contains(&ext)
                })
        })
        .filter(|path| path.is_file())
        .collect();
    found.sort();
    found.into_iter().next()
}

/// Fetch `url` into `{prefix}.{ext}`, the extension coming from the response's
/// content type. Nothing is requested when a file for `prefix` already exists.
pub fn download_media<T: Transport + ?Sized>(
    transport: &T,
    url: &str,
    prefix: &Path,
) -> Result<DownloadOutcome> {
    if let Some(existing) = existing_media(prefix) {
        return Ok(DownloadOutcome::AlreadyPresent(existing));
    }

    let mut media = transport.get_media(url)?;
    let content_type = media.content_type.as_deref().unwrap_or_default();
    let ext = extension_from_content_type(content_type).ok_or_else(|| {
        Error::PageFormat(format!(
            "unusable content type '{}' for media {}",
            content_type, url
        ))
    })?;

    let path = path_with_ext(prefix, &ext);
    if path.is_file() {
        debug!("{:?} appeared while requesting, dropping response", path);
        return Ok(DownloadOutcome::AlreadyPresent(path));
    }

    let bytes = write_atomic_from_reader(&path, media.body.as_mut())?;
    info!("Downloaded media to {} ({} bytes)", path.display(), bytes);
    Ok(DownloadOutcome::Downloaded { path, bytes })
}
