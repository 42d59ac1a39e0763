//! Adapter configuration.

use std::time::Duration;

/// Operating mode: controls how much detail unhandled handler faults leak
/// to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// 500 responses carry the fault's error chain, for local diagnosis.
    Debug,
    /// 500 responses are the fixed `{"message": "Server Error"}` payload.
    #[default]
    Production,
}

impl Mode {
    /// Read the mode from `JETWAY_MODE` (`debug` enables debug mode;
    /// anything else, including unset, is production).
    pub fn from_env() -> Self {
        match std::env::var("JETWAY_MODE") {
            Ok(value) if value.eq_ignore_ascii_case("debug") => Mode::Debug,
            _ => Mode::Production,
        }
    }

    pub fn is_debug(self) -> bool {
        self == Mode::Debug
    }
}

/// Per-app dispatch settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    /// Upper bound on buffered request bodies, in bytes.
    pub body_limit: usize,
    /// How long a client may take to deliver its body before a 408.
    pub read_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Production,
            body_limit: 1024 * 1024,
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    /// Defaults with the mode taken from the environment.
    pub fn from_env() -> Self {
        Self {
            mode: Mode::from_env(),
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}
