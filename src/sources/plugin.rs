use crate::{common::SourceResult, protocol::StreamMap};

/// Trait that all source plugins must implement.
///
/// Each site-specific source turns the URLs it recognises into a map of
/// playable streams. Calls block until every request of the resolution has
/// completed.
pub trait SourcePlugin: Send + Sync {
  /// Unique identifier for this source (e.g., "gamepass")
  fn name(&self) -> &str;

  /// Check if this source can handle the given URL.
  fn can_handle(&self, url: &str) -> bool;

  /// Resolve the URL into its bitrate-keyed streams.
  ///
  /// Any failure aborts the whole resolution; no partial map is returned.
  fn streams(&self, url: &str) -> SourceResult<StreamMap>;
}

pub type BoxedSource = Box<dyn SourcePlugin>;
