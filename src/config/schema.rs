//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::endpoint::DEFAULT_ENDPOINT_PATTERN;

/// Root configuration for the lifecycle controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ControllerConfig {
    /// Worker launch settings.
    pub worker: WorkerConfig,

    /// Service identity.
    pub service: ServiceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Program name substituted when a launch has no arguments; also the
    /// executable the process worker spawns in that case.
    pub program: String,

    /// Arguments used by the service when the start request carries none.
    pub default_args: Vec<String>,

    /// Regular expression matching the tunnel endpoint in worker output.
    pub endpoint_pattern: String,

    /// How often the process worker polls the child and the shutdown signal.
    pub poll_interval_ms: u64,

    /// Grace period between the polite stop request and a hard kill.
    pub stop_grace_secs: u64,

    /// Initial silent-mode flag.
    pub silent: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "cloudflared".to_string(),
            default_args: Vec::new(),
            endpoint_pattern: DEFAULT_ENDPOINT_PATTERN.to_string(),
            poll_interval_ms: 100,
            stop_grace_secs: 5,
            silent: false,
        }
    }
}

/// Service identity as seen by the service manager.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name used in status narration.
    pub name: String,

    /// Human readable name.
    pub display_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "tunnel-lifecycle".to_string(),
            display_name: "Tunnel lifecycle agent".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
