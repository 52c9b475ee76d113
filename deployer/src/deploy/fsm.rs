//! Finite State Machine for the stack lifecycle

use serde::{Deserialize, Serialize};

/// Stack state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackState {
    /// Nothing deployed at the target
    Absent,

    /// Tree present and containers running
    Installed,

    /// Artifacts being re-rendered for a running stack
    Reconfiguring,

    /// Containers stopped and tree removed (terminal)
    Uninstalled,
}

/// Stack event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEvent {
    /// Fresh install completed
    Install,

    /// Begin re-rendering a running stack
    Reconfigure,

    /// Re-render and restart completed
    ReconfigureDone,

    /// Teardown completed
    Uninstall,
}

/// Stack FSM
#[derive(Debug, Clone)]
pub struct StackFsm {
    state: StackState,
}

impl StackFsm {
    /// Create a new FSM in the given state
    pub fn new(state: StackState) -> Self {
        Self { state }
    }

    /// Get current state
    pub fn state(&self) -> StackState {
        self.state
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: StackEvent) -> Result<StackState, String> {
        let new_state = match (self.state, event) {
            (StackState::Absent, StackEvent::Install) => StackState::Installed,
            (StackState::Installed, StackEvent::Reconfigure) => StackState::Reconfiguring,
            (StackState::Reconfiguring, StackEvent::ReconfigureDone) => StackState::Installed,
            (StackState::Installed, StackEvent::Uninstall) => StackState::Uninstalled,

            // Invalid transitions
            (state, event) => {
                return Err(format!("{:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }

    pub fn is_terminal(&self) -> bool {
        self.state == StackState::Uninstalled
    }
}

impl Default for StackFsm {
    fn default() -> Self {
        Self::new(StackState::Absent)
    }
}
