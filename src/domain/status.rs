// Connection status shown on the dashboard
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub fn text(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting to Firebase...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "No current data available",
            ConnectionStatus::Error => "Connection Error",
        }
    }

    /// CSS class applied to the status element.
    pub fn class(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "status connecting",
            ConnectionStatus::Connected => "status connected",
            ConnectionStatus::Disconnected => "status disconnected",
            ConnectionStatus::Error => "status error",
        }
    }
}
