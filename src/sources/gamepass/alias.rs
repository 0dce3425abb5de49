use std::sync::LazyLock;

use regex::Regex;

use crate::common::{GameAlias, SourceError, SourceResult};

pub const CONSOLE_URL_EXAMPLE: &str = "http://gamepass.nfl.com/nflgp/console.jsp?eid=1234";

static CONSOLE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^.*gamepass\.nfl\.com/nflgp/console\.jsp\?eid=(?<eid>[0-9]+)")
    .expect("console url regex is valid")
});

/// Extracts the `eid` game alias from a Game Pass console URL.
pub fn parse_alias(url: &str) -> SourceResult<GameAlias> {
  CONSOLE_URL_REGEX
    .captures(url)
    .and_then(|caps| caps.name("eid"))
    .map(|eid| GameAlias(eid.as_str().to_string()))
    .ok_or_else(|| {
      SourceError::parse(format!(
        "Could not parse game alias! Url should be in format: {}",
        CONSOLE_URL_EXAMPLE
      ))
    })
}
