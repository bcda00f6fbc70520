//! force-layout - a force-directed graph layout engine.
//!
//! Given a snapshot of a host graph (nodes, edges, locked/grabbed flags),
//! the engine computes 2D screen positions by simulating physical forces
//! (repulsion, spring attraction, gravity, friction) until the system
//! reaches a low-energy configuration or a time budget expires. The host
//! owns graph data, rendering, and input; this crate owns position
//! computation and lifecycle signaling.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Instant;
//! use force_layout::{
//!     GraphSnapshot, LayoutDriver, LayoutOptions, ScreenPoint, ViewportSize,
//! };
//!
//! let graph: GraphSnapshot = host.snapshot();
//! let driver = LayoutDriver::new(LayoutOptions::default())?;
//! let mut run = driver.start(
//!     &graph,
//!     ViewportSize::new(800.0, 600.0),
//!     &mut host,
//!     Instant::now(),
//! )?;
//!
//! // Pump from the host's frame scheduler...
//! while !run.is_finished() {
//!     run.frame(Instant::now(), &mut host);
//! }
//! // ...or run headless:
//! // run.run_to_completion(&mut host);
//! ```
//!
//! # Architecture
//!
//! - [`sim`]: the particle system (point masses, springs, force
//!   resolution, energy reporting)
//! - [`mapper`]: the bidirectional transform between simulation space and
//!   screen space
//! - [`drag`]: the interaction bridge pinning dragged nodes
//! - [`driver`]: the layout driver orchestrating a run end to end
//! - [`host`]: the narrow boundary the host implements
//! - [`config`]: run options and validation

pub mod config;
pub mod drag;
pub mod driver;
pub mod error;
pub mod host;
pub mod mapper;
pub mod sim;

pub use config::{GraphContext, LayoutOptions, ValueSpec, default_stable_energy};
pub use drag::{DragBridge, DragState};
pub use driver::{LayoutDriver, LayoutRun, REDRAW_INTERVAL};
pub use error::{LayoutError, LayoutResult};
pub use host::{
    DragEvent, EdgeSnapshot, GraphSnapshot, Host, NodeId, NodeSnapshot, ViewportSize,
};
pub use mapper::{BoundingRect, CoordinateMapper, Padding, ScreenPoint, SimPoint};
pub use sim::{EdgeAttrs, Energy, NodeAttrs, ParticleSystem, PhysicsParams};
