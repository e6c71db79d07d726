use std::time::Duration;

/// Runtime configuration describing how to reach the device controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub base_url: String,
    /// Upper bound for a single request/response call. The push channel has none.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl DeviceConfig {
    /// Construct a configuration for the controller at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(3),
        }
    }
}
