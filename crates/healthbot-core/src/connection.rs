use tracing::debug;

use crate::client::ApiClient;
use crate::state::ConnectionState;

/// Tracks backend reachability. One `probe()` makes at most two sequential
/// network attempts: the primary health endpoint, then the fallback endpoint
/// only if the primary failed. The last computed state is all other
/// components ever see.
pub struct ConnectionMonitor {
    client: ApiClient,
    state: ConnectionState,
}

impl ConnectionMonitor {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: ConnectionState::Unknown,
        }
    }

    /// Last computed state; `Unknown` until the first probe completes.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    /// Run one probe cycle and store the resulting state.
    pub async fn probe(&mut self) -> ConnectionState {
        let primary_ok = self.client.probe_primary().await;
        let fallback_ok = if primary_ok {
            false
        } else {
            self.client.probe_fallback().await
        };

        self.state = resolve_state(primary_ok, fallback_ok);
        debug!(state = ?self.state, "connection probe finished");
        self.state
    }
}

/// Policy table: primary success wins outright, fallback success downgrades
/// to Degraded, two failures mean Offline.
fn resolve_state(primary_ok: bool, fallback_ok: bool) -> ConnectionState {
    if primary_ok {
        ConnectionState::Connected
    } else if fallback_ok {
        ConnectionState::Degraded
    } else {
        ConnectionState::Offline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_success_is_connected() {
        assert_eq!(resolve_state(true, false), ConnectionState::Connected);
        // A stray fallback result must not matter once the primary answered
        assert_eq!(resolve_state(true, true), ConnectionState::Connected);
    }

    #[test]
    fn test_fallback_only_is_degraded() {
        assert_eq!(resolve_state(false, true), ConnectionState::Degraded);
    }

    #[test]
    fn test_both_failed_is_offline() {
        assert_eq!(resolve_state(false, false), ConnectionState::Offline);
    }

    #[test]
    fn test_monitor_starts_unknown() {
        let monitor = ConnectionMonitor::new(ApiClient::new("http://localhost:8000/api/health"));
        assert_eq!(monitor.state(), ConnectionState::Unknown);
    }
}
