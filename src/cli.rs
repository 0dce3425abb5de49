use std::path::PathBuf;

use clap::Parser;

use gamepass_resolver::configs::{Config, GamepassConfig};

#[derive(Parser)]
#[command(name = "gamepass-resolver")]
#[command(author, version, about = "Resolve NFL Game Pass console URLs to HLS streams")]
pub struct Cli {
    /// Console URL, e.g. http://gamepass.nfl.com/nflgp/console.jsp?eid=1234
    pub url: String,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Raw cookie header to use instead of logging in
    #[arg(long)]
    pub gamepass_cookies: Option<String>,

    /// Game Pass account username
    #[arg(long)]
    pub gamepass_username: Option<String>,

    /// Game Pass account password
    #[arg(long)]
    pub gamepass_password: Option<String>,

    /// Print the stream map as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Command-line credentials override the ones from the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.gamepass_cookies.is_none()
            && self.gamepass_username.is_none()
            && self.gamepass_password.is_none()
        {
            return;
        }

        let gamepass = config.gamepass.get_or_insert_with(GamepassConfig::default);
        if let Some(cookies) = &self.gamepass_cookies {
            gamepass.cookies = Some(cookies.clone());
        }
        if let Some(username) = &self.gamepass_username {
            gamepass.username = Some(username.clone());
        }
        if let Some(password) = &self.gamepass_password {
            gamepass.password = Some(password.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let cli = Cli::parse_from([
            "gamepass-resolver",
            "http://gamepass.nfl.com/nflgp/console.jsp?eid=1",
            "--gamepass-username",
            "cli-user",
            "--gamepass-password",
            "cli-pass",
        ]);

        let mut config = Config::from_toml(
            "[gamepass]\nusername = \"file-user\"\ncookies = \"a=1\"\n",
        )
        .unwrap();
        cli.apply_overrides(&mut config);

        let gamepass = config.gamepass.unwrap();
        assert_eq!(gamepass.username.as_deref(), Some("cli-user"));
        assert_eq!(gamepass.password.as_deref(), Some("cli-pass"));
        assert_eq!(gamepass.cookies.as_deref(), Some("a=1"));
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let cli = Cli::parse_from(["gamepass-resolver", "http://x"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert!(config.gamepass.is_none());
        assert!(!cli.json);
    }
}
