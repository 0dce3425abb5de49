use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::xml::{Element, parse_document};
use crate::common::{GameAlias, SourceError, SourceResult};

static BITRATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^.*_(?<bitrate>[0-9]+)(\.mp4)?$").expect("bitrate regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameState {
  Live { game_id: String },
  Vod { program_id: String },
}

/// One `<game>` entry of the week's game list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
  pub alias: GameAlias,
  pub state: GameState,
}

impl GameRecord {
  fn from_element(game: &Element, alias: &GameAlias) -> SourceResult<Self> {
    let is_live = game.child_text("isLive") == Some("true");

    let state = if is_live {
      let game_id = game.child_text("id").ok_or_else(|| {
        SourceError::protocol(format!("Live game {} has no <id> in the games list", alias))
      })?;
      GameState::Live {
        game_id: game_id.to_string(),
      }
    } else {
      let program_id = game.child_text("programId").ok_or_else(|| {
        SourceError::protocol(format!("Game {} has no <programId> in the games list", alias))
      })?;
      GameState::Vod {
        program_id: program_id.to_string(),
      }
    };

    Ok(Self {
      alias: alias.clone(),
      state,
    })
  }
}

/// Finds the first game whose `<elias>` equals `alias`, in document order.
pub fn find_game(games_xml: &str, alias: &GameAlias) -> SourceResult<GameRecord> {
  let root = parse_document(games_xml, "games list")?;
  let games = root
    .child("games")
    .ok_or_else(|| SourceError::protocol("Games list response has no <games> element"))?;

  for game in games.children("game") {
    match game.child_text("elias") {
      Some(elias) if elias == &**alias => return GameRecord::from_element(game, alias),
      Some(_) => {}
      None => warn!("Skipping <game> entry without <elias> while looking for {}", alias),
    }
  }

  Err(SourceError::not_found(format!("Could not find game {}", alias)))
}

/// Text of the root's `<path>` child.
pub fn extract_path(xml: &str, context: &str) -> SourceResult<String> {
  parse_document(xml, context)?
    .child_text("path")
    .map(str::to_string)
    .ok_or_else(|| SourceError::protocol(format!("{} response has no <path>", context)))
}

/// A rendition listed in a `play` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamData {
  pub bitrate: String,
  pub path: String,
  pub server_name: String,
  pub server_port: String,
}

impl StreamData {
  pub fn playlist_url(&self) -> String {
    format!(
      "http://{}:{}{}.m3u8",
      self.server_name, self.server_port, self.path
    )
  }
}

/// Parses `streamDatas/streamData` entries of a `play` response.
pub fn parse_stream_datas(xml: &str) -> SourceResult<Vec<StreamData>> {
  let root = parse_document(xml, "play")?;
  let stream_datas = root
    .child("streamDatas")
    .ok_or_else(|| SourceError::protocol("Play response has no <streamDatas> element"))?;

  stream_datas
    .children("streamData")
    .map(|stream| {
      let path = stream
        .attr("url")
        .ok_or_else(|| SourceError::protocol("<streamData> is missing its url attribute"))?;

      let bitrate = bitrate_of(path)?;

      let server = stream
        .child("httpservers")
        .and_then(|servers| servers.child("httpserver"))
        .ok_or_else(|| {
          SourceError::protocol(format!("Stream {} has no httpservers/httpserver", path))
        })?;
      let attr = |name: &str| {
        server.attr(name).map(str::to_string).ok_or_else(|| {
          SourceError::protocol(format!("httpserver of stream {} is missing {}", path, name))
        })
      };

      Ok(StreamData {
        bitrate,
        path: path.to_string(),
        server_name: attr("name")?,
        server_port: attr("port")?,
      })
    })
    .collect()
}

/// Bitrate encoded as the trailing `_<digits>` (optionally `.mp4`) of a stream url.
pub fn bitrate_of(url: &str) -> SourceResult<String> {
  BITRATE_REGEX
    .captures(url)
    .and_then(|caps| caps.name("bitrate"))
    .map(|m| m.as_str().to_string())
    .ok_or_else(|| SourceError::protocol(format!("Could not read bitrate from stream url {}", url)))
}

#[cfg(test)]
mod tests {
  use super::*;

  const WEEK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
    <result>
      <games>
        <game><elias>10</elias><isLive>false</isLive><programId>prog-10</programId></game>
        <game><elias>20</elias><isLive>true</isLive><id>2015090300</id></game>
        <game><elias>20</elias><isLive>false</isLive><programId>duplicate</programId></game>
      </games>
    </result>"#;

  fn alias(s: &str) -> GameAlias {
    GameAlias(s.to_string())
  }

  #[test]
  fn selects_first_matching_game() {
    let game = find_game(WEEK, &alias("20")).unwrap();
    assert_eq!(
      game.state,
      GameState::Live {
        game_id: "2015090300".into()
      }
    );

    let game = find_game(WEEK, &alias("10")).unwrap();
    assert_eq!(
      game.state,
      GameState::Vod {
        program_id: "prog-10".into()
      }
    );
  }

  #[test]
  fn missing_game_is_not_found() {
    match find_game(WEEK, &alias("30")) {
      Err(SourceError::NotFound(msg)) => assert!(msg.contains("30")),
      other => panic!("expected NotFound, got {other:?}"),
    }
  }

  #[test]
  fn absent_is_live_means_vod() {
    let xml = "<r><games><game><elias>7</elias><programId>p7</programId></game></games></r>";
    let game = find_game(xml, &alias("7")).unwrap();
    assert_eq!(game.state, GameState::Vod { program_id: "p7".into() });
  }

  #[test]
  fn matched_game_without_id_is_protocol_error() {
    let xml = "<r><games><game><elias>7</elias><isLive>true</isLive></game></games></r>";
    assert!(matches!(find_game(xml, &alias("7")), Err(SourceError::Protocol(_))));

    let xml = "<r><games><game><elias>7</elias></game></games></r>";
    assert!(matches!(find_game(xml, &alias("7")), Err(SourceError::Protocol(_))));
  }

  #[test]
  fn games_element_is_required() {
    assert!(matches!(
      find_game("<r><other/></r>", &alias("1")),
      Err(SourceError::Protocol(_))
    ));
  }

  #[test]
  fn extracts_path_text() {
    let path = extract_path(
      "<result><path>adaptive://a.akamaihd.net:443/nlds/x?y=1</path></result>",
      "Publish point",
    )
    .unwrap();
    assert_eq!(path, "adaptive://a.akamaihd.net:443/nlds/x?y=1");

    match extract_path("<result><status>fail</status></result>", "Publish point") {
      Err(SourceError::Protocol(msg)) => assert!(msg.contains("Publish point")),
      other => panic!("expected Protocol, got {other:?}"),
    }
  }

  #[test]
  fn reads_bitrate_suffix() {
    assert_eq!(bitrate_of("/vod/game_2400.mp4").unwrap(), "2400");
    assert_eq!(bitrate_of("/vod/game_800").unwrap(), "800");
    assert!(matches!(bitrate_of("/vod/game.mp4"), Err(SourceError::Protocol(_))));
    assert!(matches!(bitrate_of("/vod/game_2400.ts"), Err(SourceError::Protocol(_))));
  }

  #[test]
  fn parses_stream_datas() {
    let xml = r#"<result><streamDatas>
        <streamData url="/s/nfl/game_4500.mp4">
          <httpservers><httpserver name="vod1.nfl.net" port="80"/><httpserver name="vod2.nfl.net" port="81"/></httpservers>
        </streamData>
        <streamData url="/s/nfl/game_1200">
          <httpservers><httpserver name="vod3.nfl.net" port="8080"/></httpservers>
        </streamData>
      </streamDatas></result>"#;

    let streams = parse_stream_datas(xml).unwrap();
    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0].bitrate, "4500");
    assert_eq!(
      streams[0].playlist_url(),
      "http://vod1.nfl.net:80/s/nfl/game_4500.mp4.m3u8"
    );
    assert_eq!(streams[1].bitrate, "1200");
    assert_eq!(streams[1].playlist_url(), "http://vod3.nfl.net:8080/s/nfl/game_1200.m3u8");
  }

  #[test]
  fn stream_without_server_is_protocol_error() {
    let xml = r#"<result><streamDatas><streamData url="/a_400"/></streamDatas></result>"#;
    assert!(matches!(parse_stream_datas(xml), Err(SourceError::Protocol(_))));

    let xml = r#"<result><streamDatas><streamData url="/a_400"><httpservers><httpserver name="h"/></httpservers></streamData></streamDatas></result>"#;
    match parse_stream_datas(xml) {
      Err(SourceError::Protocol(msg)) => assert!(msg.contains("port")),
      other => panic!("expected Protocol, got {other:?}"),
    }
  }
}
