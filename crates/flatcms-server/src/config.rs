//! Server configuration for `FlatCMS`.
//!
//! Loads configuration from environment variables with sensible defaults.
//! `FLATCMS_ENV` switches between the production and test directory layouts;
//! every path can still be overridden individually.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default bind address when neither `FLATCMS_BIND_ADDR` nor `PORT` is set.
const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 4567);

/// Which directory layout to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// `<root>/data` and `<root>/users.toml`.
    Production,
    /// `<root>/test/data` and `<root>/test/users.toml`.
    Test,
}

impl Environment {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("test") {
            Self::Test
        } else {
            Self::Production
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Selected directory layout.
    pub environment: Environment,
    /// Directory holding the documents.
    pub data_dir: PathBuf,
    /// TOML file mapping usernames to bcrypt hashes.
    pub credentials_path: PathBuf,
    /// Cookie signing secret. `None` means generate one per process.
    pub session_secret: Option<String>,
    /// Idle lifetime of a session in seconds.
    pub session_ttl_secs: u64,
    /// Seconds between idle-session sweeps.
    pub session_sweep_interval_secs: u64,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `FLATCMS_BIND_ADDR`: full bind address (default: `127.0.0.1:4567`)
    /// - `PORT`: port to bind on `0.0.0.0` when `FLATCMS_BIND_ADDR` is unset
    /// - `FLATCMS_ENV`: `test` or `production` (default: `production`)
    /// - `FLATCMS_ROOT`: base directory for the layouts (default: `.`)
    /// - `FLATCMS_DATA_DIR`: documents directory override
    /// - `FLATCMS_CREDENTIALS`: credentials file override
    /// - `FLATCMS_SESSION_SECRET`: cookie signing secret
    /// - `FLATCMS_SESSION_TTL`: idle session lifetime in seconds (default: `86400`)
    /// - `FLATCMS_SESSION_SWEEP_INTERVAL`: seconds between sweeps (default: `300`)
    /// - `FLATCMS_LOG_LEVEL`: log filter (default: `info`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Priority: FLATCMS_BIND_ADDR > PORT > default.
        let bind_addr = if let Some(addr) = lookup("FLATCMS_BIND_ADDR") {
            addr.parse().unwrap_or_else(|_| SocketAddr::from(DEFAULT_BIND))
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().unwrap_or(DEFAULT_BIND.1);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(DEFAULT_BIND)
        };

        let environment = lookup("FLATCMS_ENV")
            .map_or(Environment::Production, |v| Environment::parse(&v));

        let root = PathBuf::from(lookup("FLATCMS_ROOT").unwrap_or_else(|| ".".to_owned()));
        let layout_root = match environment {
            Environment::Production => root,
            Environment::Test => root.join("test"),
        };

        let data_dir = lookup("FLATCMS_DATA_DIR")
            .map_or_else(|| layout_root.join("data"), PathBuf::from);
        let credentials_path = lookup("FLATCMS_CREDENTIALS")
            .map_or_else(|| layout_root.join("users.toml"), PathBuf::from);

        let session_secret = lookup("FLATCMS_SESSION_SECRET").filter(|s| !s.is_empty());

        let session_ttl_secs = lookup("FLATCMS_SESSION_TTL")
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let session_sweep_interval_secs = lookup("FLATCMS_SESSION_SWEEP_INTERVAL")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(300);

        let log_level = lookup("FLATCMS_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        Self {
            bind_addr,
            environment,
            data_dir,
            credentials_path,
            session_secret,
            session_ttl_secs,
            session_sweep_interval_secs,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_use_production_layout() {
        let config = config_with(&[]);
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 4567)));
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.data_dir, Path::new("./data"));
        assert_eq!(config.credentials_path, Path::new("./users.toml"));
        assert_eq!(config.session_secret, None);
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.session_sweep_interval_secs, 300);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_environment_switches_layout() {
        let config = config_with(&[("FLATCMS_ENV", "test"), ("FLATCMS_ROOT", "/srv/cms")]);
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.data_dir, Path::new("/srv/cms/test/data"));
        assert_eq!(config.credentials_path, Path::new("/srv/cms/test/users.toml"));
    }

    #[test]
    fn explicit_paths_override_layout() {
        let config = config_with(&[
            ("FLATCMS_ENV", "test"),
            ("FLATCMS_DATA_DIR", "/tmp/docs"),
            ("FLATCMS_CREDENTIALS", "/etc/flatcms/users.toml"),
        ]);
        assert_eq!(config.data_dir, Path::new("/tmp/docs"));
        assert_eq!(config.credentials_path, Path::new("/etc/flatcms/users.toml"));
    }

    #[test]
    fn port_binds_all_interfaces_unless_addr_given() {
        let config = config_with(&[("PORT", "8080")]);
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));

        let config = config_with(&[("PORT", "8080"), ("FLATCMS_BIND_ADDR", "127.0.0.1:9000")]);
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 9000)));
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let config = config_with(&[
            ("FLATCMS_SESSION_TTL", "soon"),
            ("FLATCMS_SESSION_SWEEP_INTERVAL", "0"),
            ("FLATCMS_SESSION_SECRET", ""),
        ]);
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.session_sweep_interval_secs, 300);
        assert_eq!(config.session_secret, None);
    }
}
