//! Tunnel endpoint side channel.
//!
//! # Responsibilities
//! - Let the worker publish its public endpoint into the lifecycle state
//! - Recognise the endpoint in worker output lines
//!
//! # Design Decisions
//! - Only the first match is reported; later lines are ignored
//! - The pattern is configurable, the default matches quick-tunnel hostnames

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::lifecycle::LifecycleState;

/// Default pattern for quick-tunnel endpoints.
pub const DEFAULT_ENDPOINT_PATTERN: &str = r"https://[a-z0-9\-]+\.trycloudflare\.com";

static DEFAULT_ENDPOINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_ENDPOINT_PATTERN).expect("default endpoint pattern is valid")
});

/// Handle through which a worker reports its endpoint.
#[derive(Debug, Clone)]
pub struct EndpointReporter {
    state: Arc<LifecycleState>,
}

impl EndpointReporter {
    pub fn new(state: Arc<LifecycleState>) -> Self {
        Self { state }
    }

    /// Publish the endpoint and mark the tunnel ready.
    pub fn report(&self, url: &str) {
        self.state.set_tunnel_endpoint(url);
    }
}

/// Scans worker output for the first endpoint.
#[derive(Debug, Clone)]
pub struct EndpointScanner {
    pattern: Regex,
    found: bool,
}

impl EndpointScanner {
    /// Build a scanner from a regular expression.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            found: false,
        })
    }

    /// Returns the endpoint the first time a line contains one.
    pub fn scan(&mut self, line: &str) -> Option<String> {
        if self.found {
            return None;
        }
        let url = self.pattern.find(line)?.as_str().to_string();
        self.found = true;
        Some(url)
    }
}

impl Default for EndpointScanner {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_ENDPOINT_REGEX.clone(),
            found: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::TunnelStatus;

    #[test]
    fn finds_quick_tunnel_url_once() {
        let mut scanner = EndpointScanner::default();
        assert!(scanner.scan("INF Requesting new quick Tunnel...").is_none());

        let line = "INF |  https://brave-otter-42.trycloudflare.com  |";
        assert_eq!(
            scanner.scan(line).as_deref(),
            Some("https://brave-otter-42.trycloudflare.com")
        );
        assert!(scanner.scan(line).is_none());
    }

    #[test]
    fn custom_pattern() {
        let mut scanner = EndpointScanner::new(r"https://\S+\.example").unwrap();
        assert_eq!(
            scanner.scan("url=https://x.example done").as_deref(),
            Some("https://x.example")
        );
        assert!(EndpointScanner::new("(").is_err());
    }

    #[test]
    fn reporter_marks_ready() {
        let state = Arc::new(LifecycleState::new());
        state.init();
        let reporter = EndpointReporter::new(Arc::clone(&state));

        reporter.report("https://x.example");
        assert_eq!(state.status(), TunnelStatus::Ready);
        assert_eq!(state.tunnel_endpoint().as_deref(), Some("https://x.example"));
    }
}
