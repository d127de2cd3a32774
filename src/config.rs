//! Statement configuration and option string parsing
//!
//! Option strings are `key=value` pairs separated by `;` or `&`:
//! - `fetch_size=100`
//! - `max_request_size=65536` (`0` or `none` for unbounded)
//! - `log_bind_values=true`

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default fetch size (0 lets the server choose)
pub const DEFAULT_FETCH_SIZE: u32 = 0;

/// Defaults applied to new statements.
///
/// # Examples
///
/// ```rust
/// use edb_rs::Config;
///
/// let config = Config::default()
///     .fetch_size(500)
///     .max_request_size(Some(1 << 20));
/// assert_eq!(config.fetch_size, 500);
///
/// let parsed: Config = "fetch_size=500;max_request_size=1048576".parse().unwrap();
/// assert_eq!(parsed, config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Initial fetch size of new statements
    pub fetch_size: u32,
    /// Upper bound of a serialized request in bytes
    pub max_request_size: Option<usize>,
    /// Include parameter values in trace logs
    pub log_bind_values: bool,
}

impl Config {
    /// Set the initial fetch size
    pub fn fetch_size(mut self, rows: u32) -> Self {
        self.fetch_size = rows;
        self
    }

    /// Set the request size limit
    pub fn max_request_size(mut self, limit: Option<usize>) -> Self {
        self.max_request_size = limit;
        self
    }

    /// Enable or disable logging of parameter values
    pub fn log_bind_values(mut self, enabled: bool) -> Self {
        self.log_bind_values = enabled;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_size: DEFAULT_FETCH_SIZE,
            max_request_size: None,
            log_bind_values: false,
        }
    }
}

fn invalid(key: &str, value: &str) -> Error {
    Error::InvalidArgument(format!("invalid value {:?} for option {}", value, key))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut config = Config::default();

        for pair in s.split([';', '&']) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::InvalidArgument(format!("expected key=value, got {:?}", pair))
            })?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "fetch_size" => {
                    config.fetch_size = value.parse().map_err(|_| invalid(&key, value))?;
                }
                "max_request_size" => {
                    config.max_request_size = if value.eq_ignore_ascii_case("none") {
                        None
                    } else {
                        match value.parse::<usize>().map_err(|_| invalid(&key, value))? {
                            0 => None,
                            limit => Some(limit),
                        }
                    };
                }
                "log_bind_values" => {
                    config.log_bind_values = parse_bool(&key, value)?;
                }
                _ => {
                    return Err(Error::InvalidArgument(format!("unknown option: {}", key)));
                }
            }
        }

        Ok(config)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetch_size={};max_request_size={};log_bind_values={}",
            self.fetch_size,
            self.max_request_size.unwrap_or(0),
            self.log_bind_values
        )
    }
}
