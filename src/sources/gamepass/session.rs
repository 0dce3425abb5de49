use std::collections::BTreeMap;

use parking_lot::RwLock;
use reqwest::{Url, cookie::CookieStore, header::HeaderValue};
use tracing::trace;

/// Cookie jar for one Game Pass session.
///
/// Cookies are kept as bare `name -> value` pairs without domain or path
/// scoping, so everything set explicitly or received from any response is sent
/// with every later request regardless of host.
#[derive(Debug, Default)]
pub struct SessionJar {
  cookies: RwLock<BTreeMap<String, String>>,
}

impl SessionJar {
  pub fn new() -> Self {
    Self::default()
  }

  /// Loads a raw `name=value; name2=value2` cookie header.
  ///
  /// Segments that do not split into exactly one name and one value are
  /// skipped without error; the service relies on this permissive behaviour.
  pub fn load_raw(&self, raw: &str) {
    let mut cookies = self.cookies.write();
    for segment in raw.split(';') {
      let parts: Vec<&str> = segment.split('=').collect();
      let [name, value] = parts.as_slice() else {
        trace!("Skipping malformed cookie segment {:?}", segment);
        continue;
      };
      cookies.insert(name.trim().to_string(), value.trim().to_string());
    }
  }

  pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
    self.cookies.write().insert(name.into(), value.into());
  }

  pub fn get(&self, name: &str) -> Option<String> {
    self.cookies.read().get(name).cloned()
  }

  pub fn snapshot(&self) -> BTreeMap<String, String> {
    self.cookies.read().clone()
  }

  pub fn header_value(&self) -> Option<String> {
    let cookies = self.cookies.read();
    if cookies.is_empty() {
      return None;
    }
    Some(
      cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; "),
    )
  }

  fn apply_set_cookie(&self, header: &str) {
    let mut attributes = header.split(';');
    let Some((name, value)) = attributes.next().and_then(|pair| pair.split_once('=')) else {
      return;
    };
    let name = name.trim();
    if name.is_empty() {
      return;
    }

    let expired = attributes.any(|attr| {
      attr
        .split_once('=')
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case("max-age"))
        .and_then(|(_, age)| age.trim().parse::<i64>().ok())
        .is_some_and(|age| age <= 0)
    });

    let mut cookies = self.cookies.write();
    if expired {
      cookies.remove(name);
    } else {
      cookies.insert(name.to_string(), value.trim().trim_matches('"').to_string());
    }
  }
}

impl CookieStore for SessionJar {
  fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
    for header in cookie_headers {
      if let Ok(raw) = header.to_str() {
        trace!("Storing cookie from {}: {}", url, raw);
        self.apply_set_cookie(raw);
      }
    }
  }

  fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
    self
      .header_value()
      .and_then(|value| HeaderValue::from_str(&value).ok())
  }
}
