//! Configuration for devname
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{DevNameError, Result};

/// Topic the cloud answers on, and the one we publish the request to
pub const DEFAULT_NAME_TOPIC: &str = "particle/device/name";

/// Default path used by the file backend
pub const DEFAULT_FILE_PATH: &str = "/usr/devicename";

/// Main configuration for a name engine
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Topics
    // -------------------------------------------------------------------------
    /// Topic the name response arrives on (subscribed once)
    pub response_topic: String,

    /// Topic published to request the name
    pub request_topic: String,

    // -------------------------------------------------------------------------
    // Recheck Configuration
    // -------------------------------------------------------------------------
    /// How long a fetched name stays fresh, measured from `last_check`.
    /// Zero disables rechecking: fetch once and go idle.
    pub recheck_interval: Duration,

    /// Dwell between recheck evaluations
    pub recheck_poll: Duration,

    // -------------------------------------------------------------------------
    // Fetch Timing
    // -------------------------------------------------------------------------
    /// Delay after connecting before publishing, so the subscription settles
    pub post_connect_wait: Duration,

    /// How long to wait for a response before backing off
    pub response_timeout: Duration,

    /// Backoff before trying again after a timeout or empty name
    pub retry_wait: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_topic: DEFAULT_NAME_TOPIC.to_string(),
            request_topic: DEFAULT_NAME_TOPIC.to_string(),
            recheck_interval: Duration::ZERO,
            recheck_poll: Duration::from_millis(10_000),
            post_connect_wait: Duration::from_millis(2_000),
            response_timeout: Duration::from_millis(15_000),
            retry_wait: Duration::from_secs(5 * 60), // 5 minutes
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.response_topic.is_empty() {
            return Err(DevNameError::Config("response topic is empty".to_string()));
        }
        if self.request_topic.is_empty() {
            return Err(DevNameError::Config("request topic is empty".to_string()));
        }
        if self.recheck_poll.is_zero() {
            return Err(DevNameError::Config(
                "recheck poll interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the topic the name response arrives on
    pub fn response_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.response_topic = topic.into();
        self
    }

    /// Set the topic published to request the name
    pub fn request_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.request_topic = topic.into();
        self
    }

    /// Set the recheck interval (zero = never recheck)
    pub fn recheck_interval(mut self, interval: Duration) -> Self {
        self.config.recheck_interval = interval;
        self
    }

    /// Set the dwell between recheck evaluations
    pub fn recheck_poll(mut self, poll: Duration) -> Self {
        self.config.recheck_poll = poll;
        self
    }

    /// Set the post-connect settle delay
    pub fn post_connect_wait(mut self, wait: Duration) -> Self {
        self.config.post_connect_wait = wait;
        self
    }

    /// Set the response timeout
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Set the retry backoff
    pub fn retry_wait(mut self, wait: Duration) -> Self {
        self.config.retry_wait = wait;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
