use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bitrate label (e.g. `"4500"`) mapped to the rendition offered at that bitrate.
pub type StreamMap = BTreeMap<String, StreamDescriptor>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamKind {
    Hls,
}

/// A playable stream endpoint handed to the playback host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDescriptor {
    pub kind: StreamKind,
    pub url: String,
    /// Extra request headers the player must send.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Cookies shared with the API session at resolution time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cookies: BTreeMap<String, String>,
}

impl StreamDescriptor {
    pub fn hls(url: impl Into<String>) -> Self {
        Self {
            kind: StreamKind::Hls,
            url: url.into(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    /// `Cookie` header value for the shared session cookies, if any.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Entries ordered from the highest numeric bitrate to the lowest.
pub fn by_bitrate_desc(streams: &StreamMap) -> Vec<(&str, &StreamDescriptor)> {
    let mut entries: Vec<_> = streams.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by_key(|(bitrate, _)| std::cmp::Reverse(bitrate.parse::<u64>().unwrap_or(0)));
    entries
}
