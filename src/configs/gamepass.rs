use serde::{Deserialize, Serialize};

/// `[gamepass]` section. Only `cookies`, `username` and `password` take part
/// in authentication; the URLs exist so the endpoints can be redirected.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GamepassConfig {
    pub cookies: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

fn default_base_url() -> String {
    "https://gamepass.nfl.com/nflgp".to_string()
}

fn default_login_url() -> String {
    "https://id.s.nfl.com/login".to_string()
}

impl Default for GamepassConfig {
    fn default() -> Self {
        Self {
            cookies: None,
            username: None,
            password: None,
            base_url: default_base_url(),
            login_url: default_login_url(),
        }
    }
}
