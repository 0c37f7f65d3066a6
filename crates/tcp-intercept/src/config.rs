// Copyright 2024-2026 Farlight Networks, LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Session configuration.

use std::time::Duration;

/// Configuration for a relay session.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a session may go without real traffic before the watchdog
    /// closes it.
    ///
    /// Heartbeat frames do not count as traffic. Defaults to 10 seconds.
    pub idle_timeout: Duration,

    /// Interval at which the heartbeat injector interrupts a pending
    /// backend read to emit a synthetic keep-alive frame to the client.
    ///
    /// Defaults to 1 second. Must be shorter than `idle_timeout`.
    pub heartbeat_interval: Duration,

    /// Size of the per-direction relay buffer in bytes.
    ///
    /// Defaults to 1024.
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(1),
            buffer_size: 1024,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the per-direction buffer size.
    #[must_use]
    pub const fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidLimit("buffer_size must be > 0"));
        }

        if self.idle_timeout.is_zero() {
            return Err(ConfigError::InvalidLimit("idle_timeout must be > 0"));
        }

        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::InvalidLimit("heartbeat_interval must be > 0"));
        }

        if self.heartbeat_interval >= self.idle_timeout {
            return Err(ConfigError::HeartbeatTooSlow);
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid limit value.
    #[error("invalid limit: {0}")]
    InvalidLimit(&'static str),

    /// The heartbeat interval does not fit inside the idle timeout.
    #[error("heartbeat_interval must be shorter than idle_timeout")]
    HeartbeatTooSlow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_timeout, Duration::from_secs(10));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(config.buffer_size, 1024);
    }

    #[test]
    fn config_builder() {
        let config = Config::new()
            .with_idle_timeout(Duration::from_secs(30))
            .with_heartbeat_interval(Duration::from_secs(5))
            .with_buffer_size(4096);

        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.buffer_size, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_values_are_invalid() {
        let config = Config::new().with_buffer_size(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit(_))
        ));

        let config = Config::new().with_idle_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit(_))
        ));

        let config = Config::new().with_heartbeat_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimit(_))
        ));
    }

    #[test]
    fn heartbeat_must_fit_inside_idle_timeout() {
        let config = Config::new()
            .with_idle_timeout(Duration::from_secs(1))
            .with_heartbeat_interval(Duration::from_secs(1));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HeartbeatTooSlow)
        ));
    }
}
