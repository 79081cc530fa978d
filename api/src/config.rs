use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ACCOUNTS: &str = "foo:bar,manu:123";

/// Runtime configuration, read from the environment after `.env` is loaded
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// `(user, password)` pairs accepted by the Basic-Auth gate
    pub accounts: Vec<(String, String)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            accounts: parse_accounts(DEFAULT_ACCOUNTS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var("BIND_HOST") {
            match raw.parse::<IpAddr>() {
                Ok(host) => config.host = host,
                Err(_) => tracing::warn!(
                    "Invalid value for BIND_HOST (`{raw}`), using default {}",
                    config.host
                ),
            }
        }

        if let Ok(raw) = env::var("PORT") {
            match raw.parse::<u16>() {
                Ok(port) if port > 0 => config.port = port,
                _ => tracing::warn!(
                    "Invalid value for PORT (`{raw}`), using default {DEFAULT_PORT}"
                ),
            }
        }

        if let Ok(raw) = env::var("BASIC_AUTH_ACCOUNTS") {
            let accounts = parse_accounts(&raw);
            if accounts.is_empty() {
                tracing::warn!(
                    "BASIC_AUTH_ACCOUNTS holds no valid `user:password` entry, using defaults"
                );
            } else {
                config.accounts = accounts;
            }
        }

        tracing::info!(
            "Server config loaded: addr={}, accounts={}",
            config.addr(),
            config.accounts.len()
        );

        config
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse `user:password[,user:password...]`, skipping malformed entries.
pub fn parse_accounts(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.split_once(':') {
            Some((user, password)) if !user.is_empty() => {
                Some((user.to_string(), password.to_string()))
            }
            _ => {
                tracing::warn!("Skipping malformed account entry `{entry}`");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_listens_on_8080() {
        let config = ServerConfig::default();
        assert_eq!(config.addr().port(), 8080);
        assert!(config.addr().ip().is_unspecified());
    }

    #[test]
    fn default_accounts() {
        let config = ServerConfig::default();
        assert_eq!(
            config.accounts,
            vec![
                ("foo".to_string(), "bar".to_string()),
                ("manu".to_string(), "123".to_string())
            ]
        );
    }

    #[test]
    fn parse_accounts_skips_malformed_entries() {
        let accounts = parse_accounts("alice:secret, nocolon ,:nouser,bob:p:w,,");
        assert_eq!(
            accounts,
            vec![
                ("alice".to_string(), "secret".to_string()),
                ("bob".to_string(), "p:w".to_string())
            ]
        );
    }
}
