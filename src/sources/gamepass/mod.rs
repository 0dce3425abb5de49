pub mod alias;
pub mod api;
pub mod records;
pub mod resolver;
pub mod session;
pub mod token;
pub mod xml;

use tracing::{debug, info};

use crate::{
  common::{GameAlias, SourceError, SourceResult},
  configs::GamepassConfig,
  protocol::StreamMap,
  sources::SourcePlugin,
};
pub use alias::parse_alias;
pub use api::GamepassApi;
pub use resolver::{GamepassBackend, LIVE_BITRATES, StreamResolver};

const HOST_MARKER: &str = "gamepass.nfl.com";

/// Which credentials `authenticate` will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials<'a> {
  Cookies(&'a str),
  Login { username: &'a str, password: &'a str },
}

impl<'a> Credentials<'a> {
  /// `cookies` wins over `username`/`password`; one of the two combinations is required.
  pub fn from_config(config: &'a GamepassConfig) -> SourceResult<Self> {
    if let Some(cookies) = config.cookies.as_deref() {
      return Ok(Self::Cookies(cookies));
    }

    match (config.username.as_deref(), config.password.as_deref()) {
      (Some(username), Some(password)) => Ok(Self::Login { username, password }),
      _ => Err(SourceError::config(
        "Must specify --gamepass-cookies or --gamepass-username and --gamepass-password",
      )),
    }
  }
}

/// One resolution of a console URL, owning its own API session.
pub struct Gamepass {
  api: GamepassApi,
  config: GamepassConfig,
  alias: GameAlias,
}

impl Gamepass {
  pub fn new(url: &str, config: GamepassConfig) -> SourceResult<Self> {
    let alias = parse_alias(url)?;
    let api = GamepassApi::new(&config)?;
    Ok(Self { api, config, alias })
  }

  pub fn alias(&self) -> &GameAlias {
    &self.alias
  }

  pub fn api(&self) -> &GamepassApi {
    &self.api
  }

  pub fn authenticate(&self) -> SourceResult<()> {
    match Credentials::from_config(&self.config)? {
      Credentials::Cookies(raw) => {
        debug!("Authenticating with configured cookies");
        self.api.set_cookies(raw);
      }
      Credentials::Login { username, password } => {
        debug!("Logging in as {}", username);
        self.api.login(username, password)?;
      }
    }
    Ok(())
  }

  pub fn resolve(&self) -> SourceResult<StreamMap> {
    self.authenticate()?;
    StreamResolver::new(&self.api).resolve(&self.alias)
  }
}

/// Registers Game Pass console URLs with the [`SourceManager`](crate::sources::SourceManager).
pub struct GamepassSource {
  config: GamepassConfig,
}

impl GamepassSource {
  pub fn new(config: Option<GamepassConfig>) -> Result<Self, String> {
    Ok(Self {
      config: config.unwrap_or_default(),
    })
  }
}

impl SourcePlugin for GamepassSource {
  fn name(&self) -> &str {
    "gamepass"
  }

  fn can_handle(&self, url: &str) -> bool {
    url.contains(HOST_MARKER)
  }

  fn streams(&self, url: &str) -> SourceResult<StreamMap> {
    let gamepass = Gamepass::new(url, self.config.clone())?;
    info!("Resolving Game Pass game {}", gamepass.alias());
    gamepass.resolve()
  }
}
