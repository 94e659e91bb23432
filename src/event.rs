//! Event collection for round processing.
//!
//! The engine emits typed events while it works (dropped decisions, machine
//! breakdowns, bankruptcies, phase changes). Collection is opt-in: a disabled
//! bus makes every emit a no-op, so the hot path pays nothing.

use crate::module::ModuleKind;
use serde::{Deserialize, Serialize};

/// A round event with its round number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundEvent {
    /// Round in which this event occurred
    pub round: u32,
    /// The type and details of the event
    pub event_type: EventType,
}

/// Types of events the engine records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EventType {
    /// A decision was dropped or corrected during validation or processing
    DecisionDropped { team_id: String, module: ModuleKind, reason: String },
    /// A module processor failed and its effects were rolled back
    ModuleRolledBack { team_id: String, module: ModuleKind, reason: String },
    /// A team's cash went negative at round close
    Bankruptcy { team_id: String, cash: f64 },
    /// The economic phase changed
    PhaseChanged { from: String, to: String },
    /// A named economy event fired
    EconomyEvent { name: String },
    /// A round completed
    RoundCompleted { round: u32, teams: usize },
}

/// Collects engine events for one game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBus {
    events: Vec<RoundEvent>,
    enabled: bool,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// With `enabled` false all emit operations are no-ops.
    pub fn new(enabled: bool) -> Self {
        Self { events: Vec::new(), enabled }
    }

    pub fn emit(&mut self, round: u32, event_type: EventType) {
        if !self.enabled {
            return;
        }
        self.events.push(RoundEvent { round, event_type });
    }

    /// Get all collected events
    pub fn events(&self) -> &[RoundEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Clear all collected events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
