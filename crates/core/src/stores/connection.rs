use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Which downstream store an observation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Cache,
    Durable,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Durable => write!(f, "durable"),
        }
    }
}

/// Connection lifecycle of a store.
///
/// ```text
/// Disconnected -> Connecting -> Connected <-> Degraded
///      ^              |                          |
///      +--------------+--------------------------+
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Connected, but the last request failed.
    Degraded,
}

impl ConnectionState {
    /// Only a healthy connection counts as available.
    pub fn is_available(self) -> bool {
        matches!(self, Self::Connected)
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::Degraded => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Degraded,
            _ => Self::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Degraded => write!(f, "Degraded"),
        }
    }
}

/// Lock-free holder for a store's [`ConnectionState`].
///
/// Reads never block, which keeps `is_available()` cheap.
#[derive(Debug)]
pub struct ConnectionStateCell(AtomicU8);

impl ConnectionStateCell {
    pub fn new(initial: ConnectionState) -> Self {
        Self(AtomicU8::new(initial.to_u8()))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Store a new state and return the previous one.
    pub fn set(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from_u8(self.0.swap(state.to_u8(), Ordering::AcqRel))
    }

    /// Move to `next` only if the current state is `expected`.
    pub fn transition(&self, expected: ConnectionState, next: ConnectionState) -> bool {
        self.0
            .compare_exchange(
                expected.to_u8(),
                next.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for ConnectionStateCell {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connected_is_available() {
        assert!(ConnectionState::Connected.is_available());
        assert!(!ConnectionState::Degraded.is_available());
        assert!(!ConnectionState::Connecting.is_available());
        assert!(!ConnectionState::Disconnected.is_available());
    }

    #[test]
    fn test_cell_set_returns_previous() {
        let cell = ConnectionStateCell::default();
        assert_eq!(cell.get(), ConnectionState::Disconnected);
        assert_eq!(
            cell.set(ConnectionState::Connecting),
            ConnectionState::Disconnected
        );
        assert_eq!(cell.get(), ConnectionState::Connecting);
    }

    #[test]
    fn test_cell_transition_is_conditional() {
        let cell = ConnectionStateCell::new(ConnectionState::Connected);
        assert!(!cell.transition(ConnectionState::Disconnected, ConnectionState::Connecting));
        assert_eq!(cell.get(), ConnectionState::Connected);
        assert!(cell.transition(ConnectionState::Connected, ConnectionState::Degraded));
        assert_eq!(cell.get(), ConnectionState::Degraded);
    }
}
