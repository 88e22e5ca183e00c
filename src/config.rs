//! Configuration.
//!
//! ```toml
//! addr = "0.0.0.0:3000"
//! session_cookie = "SESSIONID"
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SESSION_COOKIE: &str = "SESSIONID";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listen address used by [`Server::from_config`](crate::Server::from_config).
    pub addr: String,
    /// Name of the cookie that carries the session id.
    pub session_cookie: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_owned(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
        }
    }
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn keys_override_defaults() {
        let config = Config::from_toml_str(r#"session_cookie = "sid""#).unwrap();
        assert_eq!(config.session_cookie, "sid");
        assert_eq!(config.addr, DEFAULT_ADDR);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml_str("port = 1"), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(Config::load("/no/such/rally.toml"), Err(Error::Io(_))));
    }
}
