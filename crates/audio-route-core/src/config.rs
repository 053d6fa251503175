//! Routing worker configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};

/// Configuration for the serialized routing worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Capacity of the single inbound queue
    pub queue_capacity: usize,
    /// Name used in logs and dumps
    pub worker_name: String,
    /// Number of processed messages kept for the dump
    pub history_size: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            worker_name: "call-audio-route".to_string(),
            history_size: 32,
        }
    }
}

impl RoutingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(RouteError::config("queue_capacity must be greater than zero"));
        }
        if self.worker_name.trim().is_empty() {
            return Err(RouteError::config("worker_name must not be empty"));
        }
        Ok(())
    }

    /// Parse a JSON document; absent fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RouteError::config(format!("Parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RouteError::config(format!("Cannot read {}: {}", path, e)))?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoutingConfig::default();
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.worker_name, "call-audio-route");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RoutingConfig::from_json_str(r#"{ "queue_capacity": 8 }"#).unwrap();
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.history_size, 32);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = RoutingConfig::from_json_str(r#"{ "queue_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, RouteError::Config { .. }));

        let err = RoutingConfig::new().with_worker_name("  ").validate().unwrap_err();
        assert!(err.to_string().contains("worker_name"));
    }

    #[test]
    fn test_missing_file() {
        let err = RoutingConfig::from_file("/nonexistent/routing.json").unwrap_err();
        assert!(matches!(err, RouteError::Config { .. }));
    }
}
