// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::state::DEFAULT_MAX_BOARDS;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

pub const DATABASE_URL_VAR: &str = "TASKBUDDY_DATABASE_URL";
pub const BIND_ADDR_VAR: &str = "TASKBUDDY_BIND_ADDR";
pub const STORE_TIMEOUT_VAR: &str = "TASKBUDDY_STORE_TIMEOUT_SECS";
pub const MAX_BOARDS_VAR: &str = "TASKBUDDY_MAX_BOARDS";

const DEFAULT_DATABASE_URL: &str = "sqlite://database/taskbuddy.db";
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

/// Server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Per-call limit on store calls. `None` waits forever.
    pub store_timeout: Option<Duration>,
    /// Boards kept in memory at once. `None` never evicts.
    pub max_boards: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
            store_timeout: Some(Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS)),
            max_boards: Some(DEFAULT_MAX_BOARDS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Unset variables
    /// keep their default; unparsable ones are reported and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.database_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(BIND_ADDR_VAR) {
            match raw.trim().parse::<SocketAddr>() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!(
                    "Ignoring {}={:?}: {}. Using {}.",
                    BIND_ADDR_VAR, raw, e, config.bind_addr
                ),
            }
        }

        if let Some(raw) = lookup(STORE_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.store_timeout = None,
                Ok(secs) => config.store_timeout = Some(Duration::from_secs(secs)),
                Err(e) => warn!(
                    "Ignoring {}={:?}: {}. Using {}s.",
                    STORE_TIMEOUT_VAR, raw, e, DEFAULT_STORE_TIMEOUT_SECS
                ),
            }
        }

        if let Some(raw) = lookup(MAX_BOARDS_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.max_boards = None,
                Ok(max) => config.max_boards = Some(max),
                Err(e) => warn!(
                    "Ignoring {}={:?}: {}. Using {}.",
                    MAX_BOARDS_VAR, raw, e, DEFAULT_MAX_BOARDS
                ),
            }
        }

        config
    }
}
