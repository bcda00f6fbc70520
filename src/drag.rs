//! Interactive-drag integration
//!
//! While a node is grabbed the bridge is the sole authority over its
//! position: the particle is pinned at the drag point (converted to
//! simulation space) and excluded from force integration, though it still
//! pushes and pulls its neighbors. On release the particle re-enters
//! integration with a temporarily elevated mass so the simulation does not
//! fling it away from where the user placed it.

use std::collections::HashMap;

use crate::host::{DragEvent, NodeId};
use crate::mapper::CoordinateMapper;
use crate::sim::ParticleSystem;

/// Per-node drag state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    /// Not being dragged; simulation-driven
    Free,
    /// Actively dragged; position driven by drag updates
    Grabbed,
    /// Just let go; re-enters integration on the next tick
    Released,
}

/// Translates host drag gestures into pin state on the particle system
#[derive(Default)]
pub struct DragBridge {
    states: HashMap<NodeId, DragState>,
}

impl DragBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a node; nodes the bridge has never seen are Free
    pub fn state(&self, id: &str) -> DragState {
        self.states.get(id).copied().unwrap_or(DragState::Free)
    }

    pub fn is_grabbed(&self, id: &str) -> bool {
        self.state(id) == DragState::Grabbed
    }

    pub fn any_grabbed(&self) -> bool {
        self.states.values().any(|s| *s == DragState::Grabbed)
    }

    /// Apply a drag gesture. Events for ids without a particle (locked or
    /// unknown nodes) are ignored, as are moves and releases for nodes that
    /// are not grabbed.
    pub fn handle(
        &mut self,
        event: &DragEvent,
        system: &mut ParticleSystem,
        mapper: &CoordinateMapper,
    ) {
        match event {
            DragEvent::Grab { id, position } => {
                if system.pin(id, mapper.to_sim(*position)) {
                    self.states.insert(id.clone(), DragState::Grabbed);
                }
            }
            DragEvent::Move { id, position } => {
                if self.is_grabbed(id) {
                    system.pin(id, mapper.to_sim(*position));
                }
            }
            DragEvent::Release { id } => {
                if self.is_grabbed(id) {
                    system.release(id);
                    self.states.insert(id.clone(), DragState::Released);
                }
            }
        }
    }

    /// Promote Released nodes back to Free; called once per frame after the
    /// tick that reintegrated them
    pub fn settle(&mut self) {
        self.states.retain(|_, s| *s != DragState::Released);
    }
}
