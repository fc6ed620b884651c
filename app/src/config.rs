use crate::error::ConfigError;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    bind_addr: IpAddr,
    server_port: u16,
    database_url: Option<String>,
    database_max_connections: u32,
    run_migrations: bool,
    body_limit: u64,
    log_level: String,
    trace_stdout: bool,
}

impl Config {
    /// Reads the configuration from the environment, after loading an optional `.env` file
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Ok(Config {
            bind_addr: parse_var("BIND_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            server_port: parse_var("SERVER_PORT", 8000)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            run_migrations: parse_var("RUN_MIGRATIONS", true)?,
            body_limit: parse_var("BODY_LIMIT", 16 * 1024)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
            trace_stdout: parse_var("TRACE_STDOUT", false)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.server_port)
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn database_max_connections(&self) -> u32 {
        self.database_max_connections
    }

    pub fn run_migrations(&self) -> bool {
        self.run_migrations
    }

    pub fn body_limit(&self) -> u64 {
        self.body_limit
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn trace_stdout(&self) -> bool {
        self.trace_stdout
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    parse_value(key, env::var(key).ok(), default)
}

fn parse_value<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, value)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_value_defaults() {
        assert_eq!(8000u16, parse_value("SERVER_PORT", None, 8000).unwrap());
        assert_eq!(8000u16, parse_value("SERVER_PORT", Some("  ".to_owned()), 8000).unwrap());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(9090u16, parse_value("SERVER_PORT", Some("9090".to_owned()), 8000).unwrap());
        assert!(parse_value("TRACE_STDOUT", Some("true".to_owned()), false).unwrap());
    }

    #[test]
    fn test_parse_invalid_value() {
        let res = parse_value::<u16>("SERVER_PORT", Some("http".to_owned()), 8000);
        match res {
            Err(ConfigError::Invalid(key, value)) => {
                assert_eq!("SERVER_PORT", key);
                assert_eq!("http", value);
            }
            Ok(_) => panic!("Parsed invalid port"),
        }
    }
}
