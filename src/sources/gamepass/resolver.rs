use std::collections::BTreeMap;

use tracing::{debug, info};

use super::records::{self, GameState};
use crate::{
  common::{GameAlias, SourceResult},
  protocol::{StreamDescriptor, StreamMap},
};

/// Bitrates offered for every live game.
pub const LIVE_BITRATES: [&str; 7] = ["4500", "3000", "2400", "1600", "1200", "800", "400"];

/// Placeholder in live playlist urls that is replaced by a bitrate.
const LIVE_BITRATE_TOKEN: &str = "androidtab";

/// The calls the resolver needs from an authenticated Game Pass session.
pub trait GamepassBackend {
  fn fetch_week_games(&self, alias: &GameAlias) -> SourceResult<String>;
  fn fetch_encrypted_video_path(&self, program_id: &str) -> SourceResult<String>;
  fn fetch_publish_point(&self, game_id: &str) -> SourceResult<String>;
  fn resolve_play_path(&self, raw_path: &str) -> SourceResult<String>;
  fn fetch_stream_auth_cookie(&self, url: &str) -> SourceResult<String>;
  fn session_cookies(&self) -> BTreeMap<String, String>;
}

/// Turns a game alias into its bitrate-keyed streams. Expects an authenticated backend.
pub struct StreamResolver<'a, B: GamepassBackend + ?Sized> {
  backend: &'a B,
}

impl<'a, B: GamepassBackend + ?Sized> StreamResolver<'a, B> {
  pub fn new(backend: &'a B) -> Self {
    Self { backend }
  }

  pub fn resolve(&self, alias: &GameAlias) -> SourceResult<StreamMap> {
    let games = self.backend.fetch_week_games(alias)?;
    let game = records::find_game(&games, alias)?;

    let streams = match &game.state {
      GameState::Live { game_id } => {
        info!("Game {} is live (game id {})", alias, game_id);
        self.live_streams(game_id)?
      }
      GameState::Vod { program_id } => {
        info!("Game {} is on demand (program id {})", alias, program_id);
        self.vod_streams(program_id)?
      }
    };

    info!("Resolved {} streams for game {}", streams.len(), alias);
    Ok(streams)
  }

  fn live_streams(&self, game_id: &str) -> SourceResult<StreamMap> {
    let publish_point = self.backend.fetch_publish_point(game_id)?;
    let path = records::extract_path(&publish_point, &format!("Publish point for game {}", game_id))?;
    let url = path.replace("adaptive://", "http://");

    let cookie = self.backend.fetch_stream_auth_cookie(&url)?;
    debug!("Obtained stream auth cookie for {}", url);

    Ok(
      LIVE_BITRATES
        .iter()
        .map(|bitrate| {
          let stream = StreamDescriptor::hls(url.replace(LIVE_BITRATE_TOKEN, bitrate))
            .with_header("Cookie", cookie.as_str());
          (bitrate.to_string(), stream)
        })
        .collect(),
    )
  }

  fn vod_streams(&self, program_id: &str) -> SourceResult<StreamMap> {
    let encrypted = self.backend.fetch_encrypted_video_path(program_id)?;
    let game_path = records::extract_path(
      &encrypted,
      &format!("Encrypted video path for program {}", program_id),
    )?;

    let play = self.backend.resolve_play_path(&game_path)?;
    let cookies = self.backend.session_cookies();

    Ok(
      records::parse_stream_datas(&play)?
        .into_iter()
        .map(|data| {
          let stream = StreamDescriptor::hls(data.playlist_url()).with_cookies(cookies.clone());
          (data.bitrate, stream)
        })
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::common::SourceError;

  const LIVE_WEEK: &str = "<result><games>\
      <game><elias>10</elias><isLive>false</isLive><programId>p10</programId></game>\
      <game><elias>20</elias><isLive>true</isLive><id>2015091000</id></game>\
    </games></result>";

  #[derive(Default)]
  struct FakeBackend {
    games: String,
    publish_point: String,
    encrypted: String,
    play: String,
    auth_cookie: Option<String>,
    calls: RefCell<Vec<String>>,
  }

  impl GamepassBackend for FakeBackend {
    fn fetch_week_games(&self, alias: &GameAlias) -> SourceResult<String> {
      self.calls.borrow_mut().push(format!("games:{}", alias));
      Ok(self.games.clone())
    }

    fn fetch_encrypted_video_path(&self, program_id: &str) -> SourceResult<String> {
      self.calls.borrow_mut().push(format!("encrypt:{}", program_id));
      Ok(self.encrypted.clone())
    }

    fn fetch_publish_point(&self, game_id: &str) -> SourceResult<String> {
      self.calls.borrow_mut().push(format!("publish:{}", game_id));
      Ok(self.publish_point.clone())
    }

    fn resolve_play_path(&self, raw_path: &str) -> SourceResult<String> {
      self.calls.borrow_mut().push(format!("play:{}", raw_path));
      Ok(self.play.clone())
    }

    fn fetch_stream_auth_cookie(&self, url: &str) -> SourceResult<String> {
      self.calls.borrow_mut().push(format!("cookie:{}", url));
      self
        .auth_cookie
        .clone()
        .ok_or_else(|| SourceError::protocol("no Set-Cookie"))
    }

    fn session_cookies(&self) -> BTreeMap<String, String> {
      BTreeMap::from([("JSESSIONID".to_string(), "abc".to_string())])
    }
  }

  fn alias(s: &str) -> GameAlias {
    GameAlias(s.to_string())
  }

  #[test]
  fn live_game_yields_one_stream_per_fixed_bitrate() {
    let backend = FakeBackend {
      games: LIVE_WEEK.into(),
      publish_point: "<result><path>adaptive://live.nfl.net/nlds/androidtab/master.m3u8</path></result>"
        .into(),
      auth_cookie: Some("hdntl=exp=1~acl=*; path=/".into()),
      ..Default::default()
    };

    let streams = StreamResolver::new(&backend).resolve(&alias("20")).unwrap();

    assert_eq!(streams.len(), 7);
    for bitrate in LIVE_BITRATES {
      let stream = &streams[bitrate];
      assert_eq!(
        stream.url,
        format!("http://live.nfl.net/nlds/{}/master.m3u8", bitrate)
      );
      assert_eq!(stream.headers["Cookie"], "hdntl=exp=1~acl=*; path=/");
      assert!(stream.cookies.is_empty());
    }

    assert_eq!(
      *backend.calls.borrow(),
      vec![
        "games:20".to_string(),
        "publish:2015091000".to_string(),
        "cookie:http://live.nfl.net/nlds/androidtab/master.m3u8".to_string(),
      ]
    );
  }

  #[test]
  fn live_game_without_auth_cookie_fails() {
    let backend = FakeBackend {
      games: LIVE_WEEK.into(),
      publish_point: "<result><path>adaptive://live.nfl.net/androidtab.m3u8</path></result>".into(),
      ..Default::default()
    };

    assert!(matches!(
      StreamResolver::new(&backend).resolve(&alias("20")),
      Err(SourceError::Protocol(_))
    ));
  }

  #[test]
  fn vod_game_builds_playlists_from_play_response() {
    let backend = FakeBackend {
      games: LIVE_WEEK.into(),
      encrypted: "<result><path>adaptive://vod.nfl.net:443/s/game?e=1</path></result>".into(),
      play: r#"<result><streamDatas>
          <streamData url="/s/game_2400.mp4"><httpservers><httpserver name="h1.nfl.net" port="80"/></httpservers></streamData>
          <streamData url="/s/game_800.mp4"><httpservers><httpserver name="h2.nfl.net" port="80"/></httpservers></streamData>
        </streamDatas></result>"#
        .into(),
      ..Default::default()
    };

    let streams = StreamResolver::new(&backend).resolve(&alias("10")).unwrap();

    assert_eq!(streams.keys().collect::<Vec<_>>(), vec!["2400", "800"]);
    assert_eq!(streams["2400"].url, "http://h1.nfl.net:80/s/game_2400.mp4.m3u8");
    assert_eq!(streams["800"].cookies["JSESSIONID"], "abc");
    assert!(streams["800"].headers.is_empty());

    assert_eq!(
      *backend.calls.borrow(),
      vec![
        "games:10".to_string(),
        "encrypt:p10".to_string(),
        "play:adaptive://vod.nfl.net:443/s/game?e=1".to_string(),
      ]
    );
  }

  #[test]
  fn unknown_alias_stops_before_stream_calls() {
    let backend = FakeBackend {
      games: LIVE_WEEK.into(),
      ..Default::default()
    };

    assert!(matches!(
      StreamResolver::new(&backend).resolve(&alias("30")),
      Err(SourceError::NotFound(_))
    ));
    assert_eq!(*backend.calls.borrow(), vec!["games:30".to_string()]);
  }

  #[test]
  fn vod_stream_without_bitrate_suffix_fails_whole_resolution() {
    let backend = FakeBackend {
      games: LIVE_WEEK.into(),
      encrypted: "<result><path>adaptive://vod.nfl.net:443/s/game</path></result>".into(),
      play: r#"<result><streamDatas>
          <streamData url="/s/game_2400.mp4"><httpservers><httpserver name="h" port="80"/></httpservers></streamData>
          <streamData url="/s/game_hd.mp4"><httpservers><httpserver name="h" port="80"/></httpservers></streamData>
        </streamDatas></result>"#
        .into(),
      ..Default::default()
    };

    assert!(matches!(
      StreamResolver::new(&backend).resolve(&alias("10")),
      Err(SourceError::Protocol(_))
    ));
  }
}
