use super::orchestrator::FlowEvents;
use crate::domain::flow::{FlowState, TerminalRoute};

/// Screen-level view of the booking payment, fed by a flow's events.
///
/// Keeps the pay action disabled while a flow is in flight, which is what
/// keeps a double tap from reaching the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingUiState {
    current: FlowState,
}

impl Default for BookingUiState {
    fn default() -> Self {
        Self {
            current: FlowState::Idle,
        }
    }
}

impl BookingUiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, state: FlowState) {
        self.current = state;
    }

    /// Applies every state of `events` in order and returns where the flow landed.
    ///
    /// A flow abandoned by cancellation closes its events without a terminal
    /// state; the screen is then back at `Idle`.
    pub async fn follow(&mut self, mut events: FlowEvents) -> &FlowState {
        while let Some(state) = events.recv().await {
            self.apply(state);
        }
        if !self.current.is_terminal() {
            self.current = FlowState::Idle;
        }
        &self.current
    }

    pub fn current(&self) -> &FlowState {
        &self.current
    }

    pub fn pay_enabled(&self) -> bool {
        !self.current.is_in_flight()
    }

    pub fn route(&self) -> Option<TerminalRoute> {
        self.current.route()
    }

    /// Clears an error or cancellation notice. Other states stay put.
    pub fn dismiss(&mut self) -> bool {
        if self.route() == Some(TerminalRoute::Dismissible) {
            self.current = FlowState::Idle;
            true
        } else {
            false
        }
    }
}
