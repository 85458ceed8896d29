//! Connectivity status shown on the status line.
//!
//! Priority, evaluated fresh on every call:
//! 1. wired interface up -> "Ethernet"
//! 2. reachability check succeeds -> configured fallback label
//! 3. otherwise -> "No internet"

mod link;

use std::time::Duration;

use tracing::debug;

use crate::config::StatusConfig;

pub use link::{LinkStatus, SystemLink};

pub const ETHERNET_LABEL: &str = "Ethernet";
pub const OFFLINE_LABEL: &str = "No internet";

/// Which connectivity icon to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    WifiOn,
    WifiOff,
}

/// Result of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub label: String,
    pub connected: bool,
}

impl ConnectionStatus {
    pub fn ethernet() -> Self {
        Self {
            label: ETHERNET_LABEL.to_string(),
            connected: true,
        }
    }

    pub fn fallback(label: &str) -> Self {
        Self {
            label: label.to_string(),
            connected: true,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            label: OFFLINE_LABEL.to_string(),
            connected: false,
        }
    }

    pub fn icon(&self) -> StatusIcon {
        if self.connected {
            StatusIcon::WifiOn
        } else {
            StatusIcon::WifiOff
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Derives a [`ConnectionStatus`] from host network state.
pub struct StatusProbe<L> {
    link: L,
    interface: String,
    fallback_label: String,
    endpoint: String,
    timeout: Duration,
}

impl<L: LinkStatus> StatusProbe<L> {
    pub fn new(link: L, config: &StatusConfig) -> Self {
        Self {
            link,
            interface: config.interface.clone(),
            fallback_label: config.fallback_label.clone(),
            endpoint: config.endpoint.clone(),
            timeout: config.timeout(),
        }
    }

    #[cfg(test)]
    pub(crate) fn link(&self) -> &L {
        &self.link
    }

    /// Runs the probe. Query errors count as "not connected" for that step.
    pub fn probe(&self) -> ConnectionStatus {
        match self.link.interface_up(&self.interface) {
            Ok(true) => return ConnectionStatus::ethernet(),
            Ok(false) => {}
            Err(e) => debug!("Interface {} query failed: {}", self.interface, e),
        }

        match self.link.reachable(&self.endpoint, self.timeout) {
            Ok(()) => ConnectionStatus::fallback(&self.fallback_label),
            Err(e) => {
                debug!("Reachability check to {} failed: {}", self.endpoint, e);
                ConnectionStatus::disconnected()
            }
        }
    }
}
