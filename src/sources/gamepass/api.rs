use std::sync::Arc;

use reqwest::{blocking, header::{SET_COOKIE, USER_AGENT}};
use tracing::debug;

use super::{resolver::GamepassBackend, session::SessionJar, token};
use crate::{
  common::{GameAlias, HttpClient, SourceError, SourceResult},
  configs::GamepassConfig,
};

const LOGIN_REDIRECT: &str =
  "/secure/login?redirect=loginform&redirectnosub=packages&redirectsub=schedule";
const GAMES_PATH: &str = "/servlets/games";
const ENCRYPT_VIDEO_PATH: &str = "/servlets/encryptvideopath";
const PUBLISH_POINT_PATH: &str = "/servlets/publishpoint";
const VENDOR_ID: &str = "nflptnrnln";

const ADAPTIVE_SCHEME: &str = "adaptive://";
const PORT_MARKER: &str = ":443";
const PLAY_QUERY_SAFE: &[u8] = b":&=";

/// HTTP client for the Game Pass servlets.
///
/// Every call goes through one [`SessionJar`], so cookies from `login` or
/// `set_cookies` accompany all later requests.
pub struct GamepassApi {
  client: blocking::Client,
  jar: Arc<SessionJar>,
  base_url: String,
  login_url: String,
  node_id: u64,
}

impl GamepassApi {
  pub fn new(config: &GamepassConfig) -> SourceResult<Self> {
    let jar = Arc::new(SessionJar::new());
    let client = HttpClient::new_blocking(jar.clone())?;

    Ok(Self {
      client,
      jar,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      login_url: config.login_url.clone(),
      node_id: token::node_id(),
    })
  }

  pub fn session(&self) -> &SessionJar {
    &self.jar
  }

  /// The servlets that must be called over plain HTTP.
  fn insecure_base_url(&self) -> String {
    self.base_url.replace("https", "http")
  }

  pub fn login(&self, username: &str, password: &str) -> SourceResult<()> {
    let redirect = format!("{}{}", self.base_url, LOGIN_REDIRECT);
    let form = [
      ("username", username),
      ("password", password),
      ("vendor_id", VENDOR_ID),
      ("error_url", redirect.as_str()),
      ("success_url", redirect.as_str()),
    ];

    let response = self
      .client
      .post(&self.login_url)
      .form(&form)
      .send()?
      .error_for_status()?;

    debug!(
      "Login response: {} (final url {}), {} session cookies",
      response.status(),
      response.url(),
      self.jar.snapshot().len()
    );
    Ok(())
  }

  pub fn set_cookies(&self, raw_cookie_header: &str) {
    self.jar.load_raw(raw_cookie_header);
    debug!("Loaded {} cookies from configuration", self.jar.snapshot().len());
  }

  pub fn fetch_week_games(&self, alias: &GameAlias) -> SourceResult<String> {
    let url = format!("{}{}", self.base_url, GAMES_PATH);
    self.post_form(&url, &[("isFlex", "True"), ("eid", &**alias)], "games list", None)
  }

  pub fn fetch_encrypted_video_path(&self, program_id: &str) -> SourceResult<String> {
    let url = format!("{}{}", self.insecure_base_url(), ENCRYPT_VIDEO_PATH);
    let plid = token::generate_plid(&mut rand::thread_rng(), self.node_id);
    let form = [
      ("path", program_id),
      ("plid", plid.as_str()),
      ("type", "fgpa"),
      ("isFlex", "true"),
    ];
    self.post_form(&url, &form, "encrypted video path", None)
  }

  pub fn fetch_publish_point(&self, game_id: &str) -> SourceResult<String> {
    let url = format!("{}{}", self.insecure_base_url(), PUBLISH_POINT_PATH);
    let form = [("id", game_id), ("type", "game"), ("nt", "1"), ("gt", "live")];
    self.post_form(&url, &form, "publish point", Some("Android"))
  }

  pub fn resolve_play_path(&self, raw_path: &str) -> SourceResult<String> {
    let url = play_url(raw_path);
    debug!("Requesting play path {}", url);
    Ok(self.client.get(&url).send()?.error_for_status()?.text()?)
  }

  pub fn fetch_stream_auth_cookie(&self, url: &str) -> SourceResult<String> {
    let response = self.client.get(url).send()?.error_for_status()?;

    let values: Vec<&str> = response
      .headers()
      .get_all(SET_COOKIE)
      .iter()
      .filter_map(|v| v.to_str().ok())
      .collect();

    if values.is_empty() {
      return Err(SourceError::protocol(format!(
        "Stream auth response for {} carried no Set-Cookie header",
        url
      )));
    }
    Ok(values.join(", "))
  }

  fn post_form(
    &self,
    url: &str,
    form: &[(&str, &str)],
    step: &str,
    user_agent: Option<&str>,
  ) -> SourceResult<String> {
    debug!("Requesting {} from {}", step, url);

    let mut request = self.client.post(url).form(form);
    if let Some(agent) = user_agent {
      request = request.header(USER_AGENT, agent);
    }

    let body = request.send()?.error_for_status()?.text()?;
    debug!("Received {} ({} bytes)", step, body.len());
    Ok(body)
  }
}

impl GamepassBackend for GamepassApi {
  fn fetch_week_games(&self, alias: &GameAlias) -> SourceResult<String> {
    GamepassApi::fetch_week_games(self, alias)
  }

  fn fetch_encrypted_video_path(&self, program_id: &str) -> SourceResult<String> {
    GamepassApi::fetch_encrypted_video_path(self, program_id)
  }

  fn fetch_publish_point(&self, game_id: &str) -> SourceResult<String> {
    GamepassApi::fetch_publish_point(self, game_id)
  }

  fn resolve_play_path(&self, raw_path: &str) -> SourceResult<String> {
    GamepassApi::resolve_play_path(self, raw_path)
  }

  fn fetch_stream_auth_cookie(&self, url: &str) -> SourceResult<String> {
    GamepassApi::fetch_stream_auth_cookie(self, url)
  }

  fn session_cookies(&self) -> std::collections::BTreeMap<String, String> {
    self.jar.snapshot()
  }
}

/// Builds the `play` request for an `adaptive://host:443/path?query` uri.
///
/// The uri is split at the `:443` marker; the host side gets an `http://`
/// scheme and keeps the marker, and the remainder (with `?` turned into `&`)
/// travels form-encoded in the `url` query parameter.
pub fn play_url(raw_path: &str) -> String {
  let (host, port, path) = match raw_path.find(PORT_MARKER) {
    Some(idx) => (
      &raw_path[..idx],
      PORT_MARKER,
      &raw_path[idx + PORT_MARKER.len()..],
    ),
    None => (raw_path, "", ""),
  };

  let path = path.replace('?', "&");
  let host = host.replace(ADAPTIVE_SCHEME, "http://");

  format!(
    "{}{}/play?{}",
    host,
    port,
    quote_plus(&format!("url={}", path), PLAY_QUERY_SAFE)
  )
}

/// Form-style percent encoding: alphanumerics, `_.-` and the bytes in `safe`
/// stay literal, space becomes `+`.
pub fn quote_plus(s: &str, safe: &[u8]) -> String {
  let mut out = String::with_capacity(s.len());
  for b in s.bytes() {
    match b {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' => out.push(b as char),
      b' ' => out.push('+'),
      b if safe.contains(&b) => out.push(b as char),
      b => out.push_str(&format!("%{:02X}", b)),
    }
  }
  out
}
