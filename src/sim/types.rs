//! Data types for the particle simulation
//!
//! Particles are point masses, springs connect them, and the energy summary
//! aggregates per-particle kinetic energy after each tick.

use serde::{Deserialize, Serialize};

use crate::mapper::SimPoint;

// =============================================================================
// Default Constants
// =============================================================================

/// Default repulsion coefficient for the many-body force
pub const DEFAULT_REPULSION: f64 = 1000.0;

/// Default spring stiffness (Hooke constant)
pub const DEFAULT_STIFFNESS: f64 = 600.0;

/// Default friction coefficient (0 = none, 1 = full stop each tick)
pub const DEFAULT_FRICTION: f64 = 0.5;

/// Default tick rate of the simulation schedule, in ticks per second
pub const DEFAULT_FPS: f64 = 55.0;

/// Default integration precision (0 = coarsest, 1 = finest)
pub const DEFAULT_PRECISION: f64 = 0.6;

/// Default integration timestep per tick, in simulation time units
pub const DEFAULT_TIMESTEP: f64 = 0.02;

/// Default particle mass
pub const DEFAULT_NODE_MASS: f64 = 1.0;

/// Default spring rest length, in simulation units
pub const DEFAULT_EDGE_LENGTH: f64 = 1.0;

/// Mass assigned to a particle when a drag releases it, decaying back to
/// its base mass over subsequent ticks
pub const RELEASE_MASS: f64 = 1000.0;

/// Fraction of the release-mass gap closed per tick
pub const RELEASE_MASS_DECAY: f64 = 0.2;

/// Gravity strength relative to the repulsion coefficient
pub const GRAVITY_REPULSION_RATIO: f64 = 0.01;

/// Minimum inter-particle distance for force calculations (avoids singularity)
pub const DISTANCE_MIN: f64 = 0.05;

/// Maximum force magnitude applied to a particle per substep
pub const MAX_FORCE: f64 = 1000.0;

/// Maximum particle speed (prevents numerical explosion)
pub const MAX_VELOCITY: f64 = 50.0;

/// Largest substep count `precision` can select
pub const MAX_SUBSTEPS: usize = 5;

/// Radius of the circle free particles are seeded on when no initial
/// position is supplied
pub const SEED_RADIUS: f64 = 1.0;

/// A point mass in the simulation
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable identity for the run, matching the host node id
    pub id: String,
    /// Position in simulation space
    pub x: f64,
    pub y: f64,
    /// Velocity
    pub vx: f64,
    pub vy: f64,
    /// Current mass; elevated temporarily after a drag release
    pub mass: f64,
    /// Mass the particle returns to once any release elevation has decayed
    pub base_mass: f64,
    /// Permanently excluded from integration; position held constant
    pub fixed: bool,
    /// Temporarily excluded from integration while dragged
    pub pinned: bool,
}

impl Particle {
    pub fn new(id: &str, position: SimPoint, mass: f64) -> Self {
        Self {
            id: id.to_string(),
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
            mass,
            base_mass: mass,
            fixed: false,
            pinned: false,
        }
    }

    pub fn position(&self) -> SimPoint {
        SimPoint::new(self.x, self.y)
    }

    /// Excluded from force-driven movement, either permanently or while
    /// dragged
    pub fn is_held(&self) -> bool {
        self.fixed || self.pinned
    }

    /// Kinetic energy sample used by the stabilization predicate
    pub fn kinetic_energy(&self) -> f64 {
        self.vx * self.vx + self.vy * self.vy
    }
}

/// Attributes for adding a particle to the system
#[derive(Debug, Clone)]
pub struct NodeAttrs {
    pub mass: f64,
    pub fixed: bool,
    /// Initial position; required when `fixed` is set, seeded
    /// deterministically otherwise
    pub position: Option<SimPoint>,
}

impl NodeAttrs {
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Hold the particle at the given position for the whole run
    pub fn fixed_at(mut self, position: SimPoint) -> Self {
        self.fixed = true;
        self.position = Some(position);
        self
    }

    pub fn with_position(mut self, position: SimPoint) -> Self {
        self.position = Some(position);
        self
    }
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            mass: DEFAULT_NODE_MASS,
            fixed: false,
            position: None,
        }
    }
}

/// A spring between two particles (indices into the particle array)
#[derive(Debug, Clone)]
pub struct Spring {
    pub source: usize,
    pub target: usize,
    /// Rest length in simulation units
    pub length: f64,
}

/// Attributes for adding a spring to the system
#[derive(Debug, Clone)]
pub struct EdgeAttrs {
    /// Rest length in simulation units
    pub length: f64,
}

impl EdgeAttrs {
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }
}

impl Default for EdgeAttrs {
    fn default() -> Self {
        Self {
            length: DEFAULT_EDGE_LENGTH,
        }
    }
}

/// Aggregate kinetic-energy statistics after a tick
///
/// `count` is the number of particles sampled (non-fixed, non-pinned); it is
/// zero until the first tick has run, which gates the stabilization
/// predicate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Energy {
    /// Largest per-particle kinetic energy
    pub max: f64,
    /// Mean kinetic energy over sampled particles
    pub mean: f64,
    /// Number of particles sampled
    pub count: usize,
}

/// Global force and integration parameters
#[derive(Debug, Clone)]
pub struct PhysicsParams {
    pub repulsion: f64,
    pub stiffness: f64,
    pub friction: f64,
    /// Weak pull toward the layout centroid
    pub gravity: bool,
    /// Centroid pull per unit displacement; derived from the repulsion
    /// tuning before any unit conversion
    pub gravity_strength: f64,
    /// Simulation time advanced per tick
    pub timestep: f64,
    /// Integration substeps per tick, derived from the precision setting
    pub substeps: usize,
}

impl PhysicsParams {
    /// Map a precision in [0, 1] to a substep count in [1, MAX_SUBSTEPS]
    pub fn substeps_for_precision(precision: f64) -> usize {
        1 + (precision.clamp(0.0, 1.0) * (MAX_SUBSTEPS - 1) as f64).round() as usize
    }

    /// Convert tuning calibrated against screen-unit geometry for a
    /// simulation running at `scale` screen units per simulation unit.
    ///
    /// The repulsion coefficient carries force times squared distance, so
    /// it shrinks with the cube of the scale; without this, repulsion
    /// swamps the springs once rest lengths are expressed in simulation
    /// units. Stiffness and gravity are forces per unit displacement and
    /// carry over unchanged.
    pub fn in_sim_units(mut self, scale: f64) -> Self {
        self.repulsion /= scale.powi(3);
        self
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            repulsion: DEFAULT_REPULSION,
            stiffness: DEFAULT_STIFFNESS,
            friction: DEFAULT_FRICTION,
            gravity: true,
            gravity_strength: DEFAULT_REPULSION * GRAVITY_REPULSION_RATIO,
            timestep: DEFAULT_TIMESTEP,
            substeps: Self::substeps_for_precision(DEFAULT_PRECISION),
        }
    }
}
