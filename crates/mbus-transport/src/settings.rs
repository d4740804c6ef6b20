//! TCP transport settings

use std::time::Duration;

use crate::error::ConfigError;

/// Timeout applied to both socket directions unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Host, port and timeout for a TCP meter connection.
///
/// Must be fully populated before [`MbusTcpConnection::connect`] is invoked;
/// the connection never fills in defaults beyond the timeout. Changing the
/// timeout affects the next connect only, never a socket that is already
/// open.
///
/// [`MbusTcpConnection::connect`]: crate::tcp::MbusTcpConnection::connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSettings {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpSettings {
    /// Settings for `host:port` with the default timeout
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Remote host name or address
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Remote TCP port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Timeout applied to both socket directions at connect time.
    ///
    /// A zero duration disables the timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the timeout from a value in seconds.
    ///
    /// Rejects negative values and leaves the stored timeout unchanged.
    /// Takes effect at the next connect; an open socket keeps the timeout it
    /// was connected with.
    pub fn set_timeout(&mut self, seconds: f64) -> Result<(), ConfigError> {
        if seconds < 0.0 {
            return Err(ConfigError::NegativeTimeout(seconds));
        }
        self.timeout = Duration::from_millis((seconds * 1000.0) as u64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout_is_four_seconds() {
        let settings = TcpSettings::new("localhost", 10001);
        assert_eq!(settings.timeout(), Duration::from_millis(4000));
    }

    #[test]
    fn test_set_timeout_converts_to_milliseconds() {
        let mut settings = TcpSettings::new("localhost", 10001);
        settings.set_timeout(1.5).unwrap();
        assert_eq!(settings.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_negative_timeout_rejected_and_unchanged() {
        let mut settings = TcpSettings::new("localhost", 10001);
        let result = settings.set_timeout(-1.0);
        assert!(matches!(result, Err(ConfigError::NegativeTimeout(_))));
        assert_eq!(settings.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_zero_timeout_allowed() {
        let mut settings = TcpSettings::new("localhost", 10001);
        settings.set_timeout(0.0).unwrap();
        assert_eq!(settings.timeout(), Duration::ZERO);
    }
}
