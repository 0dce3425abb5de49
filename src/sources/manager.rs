use super::{gamepass::GamepassSource, plugin::BoxedSource};
use crate::{
  common::{SourceError, SourceResult},
  protocol::StreamMap,
};

/// Source Manager
pub struct SourceManager {
  pub sources: Vec<BoxedSource>,
}

impl SourceManager {
  /// Create a new SourceManager with every source enabled in `config`
  pub fn new(config: &crate::configs::Config) -> Self {
    let mut sources: Vec<BoxedSource> = Vec::new();

    macro_rules! register_source {
      ($enabled:expr, $name:literal, $ctor:expr) => {
        if $enabled {
          match $ctor {
            Ok(src) => {
              tracing::debug!("Loaded source: {}", $name);
              sources.push(Box::new(src));
            }
            Err(e) => {
              tracing::error!("{} source failed to initialize: {}", $name, e);
            }
          }
        }
      };
    }

    register_source!(
      config.sources.gamepass,
      "Game Pass",
      GamepassSource::new(config.gamepass.clone())
    );

    Self { sources }
  }

  pub fn source_names(&self) -> Vec<&str> {
    self.sources.iter().map(|s| s.name()).collect()
  }

  /// Resolve `url` with the first source that claims it.
  pub fn streams(&self, url: &str) -> SourceResult<StreamMap> {
    let source = self
      .sources
      .iter()
      .find(|s| s.can_handle(url))
      .ok_or_else(|| SourceError::not_found(format!("No source can handle {}", url)))?;

    tracing::debug!("Using source {} for {}", source.name(), url);
    source.streams(url)
  }
}
