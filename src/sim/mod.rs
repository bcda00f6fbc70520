//! Force-directed particle simulation
//!
//! Graph nodes are point masses and edges are springs. Each tick resolves
//! four forces and integrates the result:
//!
//! - **Repulsion**: every particle pair pushes apart (inverse-square,
//!   scaled by both masses)
//! - **Springs**: each edge pulls its endpoints toward a rest length
//! - **Gravity**: a weak pull toward the layout centroid, when enabled
//! - **Friction**: velocity damping applied every step
//!
//! The simulation runs in an abstract box centered on the origin; see
//! [`crate::mapper`] for the screen-space mapping. Convergence is judged
//! from the [`Energy`] summary reported after each tick.

mod system;
mod types;

pub use system::ParticleSystem;
pub use types::{
    DEFAULT_EDGE_LENGTH,
    DEFAULT_FPS,
    DEFAULT_FRICTION,
    DEFAULT_NODE_MASS,
    DEFAULT_PRECISION,
    DEFAULT_REPULSION,
    DEFAULT_STIFFNESS,
    DEFAULT_TIMESTEP,
    DISTANCE_MIN,
    EdgeAttrs,
    Energy,
    GRAVITY_REPULSION_RATIO,
    MAX_FORCE,
    MAX_SUBSTEPS,
    MAX_VELOCITY,
    NodeAttrs,
    Particle,
    PhysicsParams,
    RELEASE_MASS,
    Spring,
};
