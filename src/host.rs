//! The boundary between the layout engine and its host
//!
//! The host owns graph data, rendering, and input dispatch. The engine
//! consumes an immutable [`GraphSnapshot`] taken at run start and talks back
//! through the [`Host`] trait: position write-backs, lifecycle events,
//! viewport fit requests, and interactivity toggles. Drag gestures are
//! forwarded in as [`DragEvent`]s.
//!
//! The graph must not be structurally mutated (nodes or edges added or
//! removed) while a run is active; position-only changes via drag events are
//! the sole supported concurrent mutation. Likewise, no two concurrent runs
//! may target overlapping graph elements.

use serde::{Deserialize, Serialize};

use crate::config::GraphContext;
use crate::mapper::ScreenPoint;

/// Stable node identity for the duration of a run
pub type NodeId = String;

/// A host node as seen at run start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    /// Locked nodes are immovable and excluded from the simulation entirely
    pub locked: bool,
    /// Grabbed nodes start the run pinned at their current position
    pub grabbed: bool,
    /// Current position in screen space
    pub position: ScreenPoint,
}

impl NodeSnapshot {
    pub fn new(id: impl Into<NodeId>, position: ScreenPoint) -> Self {
        Self {
            id: id.into(),
            locked: false,
            grabbed: false,
            position,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn grabbed(mut self) -> Self {
        self.grabbed = true;
        self
    }
}

/// A host edge as seen at run start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
}

impl EdgeSnapshot {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Immutable view of the host graph taken when a run starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl GraphSnapshot {
    /// Run-wide context handed to computed mass/length functions
    pub fn context(&self) -> GraphContext {
        GraphContext {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
        }
    }
}

/// Host viewport dimensions, used when no explicit bounding rectangle is
/// configured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A drag gesture notification forwarded by the host
#[derive(Debug, Clone)]
pub enum DragEvent {
    /// The user grabbed a node at the given screen position
    Grab { id: NodeId, position: ScreenPoint },
    /// The grabbed node moved to a new screen position
    Move { id: NodeId, position: ScreenPoint },
    /// The user let go of the node
    Release { id: NodeId },
}

impl DragEvent {
    pub fn node_id(&self) -> &str {
        match self {
            DragEvent::Grab { id, .. } | DragEvent::Move { id, .. } | DragEvent::Release { id } => {
                id
            }
        }
    }
}

/// Callbacks the layout driver invokes on the host
///
/// Events fire at most as documented: `layout_ready` once per run, on the
/// first frame with computed positions; `layout_stopped` exactly once per
/// run, terminal. `fit_viewport` is a request; the host decides the actual
/// viewport mutation.
pub trait Host {
    /// Write a node's authoritative position, in screen space
    fn set_node_position(&mut self, id: &str, position: ScreenPoint);

    /// Batched notification that the listed nodes moved; throttled by the
    /// driver to a visible-redraw cadence
    fn positions_changed(&mut self, moved: &[NodeId]);

    /// Request a viewport reset/fit
    fn fit_viewport(&mut self);

    /// Toggle the host's drag-to-grab interactivity
    fn set_dragging_enabled(&mut self, enabled: bool);

    /// First frame with computed positions
    fn layout_ready(&mut self);

    /// Terminal event for the run
    fn layout_stopped(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_context_counts_elements() {
        let graph = GraphSnapshot {
            nodes: vec![
                NodeSnapshot::new("a", ScreenPoint::new(0.0, 0.0)),
                NodeSnapshot::new("b", ScreenPoint::new(1.0, 1.0)).locked(),
            ],
            edges: vec![EdgeSnapshot::new("e", "a", "b")],
        };
        let ctx = graph.context();
        assert_eq!(ctx.node_count, 2);
        assert_eq!(ctx.edge_count, 1);
    }

    #[test]
    fn builders_set_flags() {
        let node = NodeSnapshot::new("a", ScreenPoint::new(0.0, 0.0))
            .locked()
            .grabbed();
        assert!(node.locked);
        assert!(node.grabbed);
    }

    #[test]
    fn drag_event_exposes_node_id() {
        let ev = DragEvent::Move {
            id: "n1".to_string(),
            position: ScreenPoint::new(5.0, 5.0),
        };
        assert_eq!(ev.node_id(), "n1");
    }
}
