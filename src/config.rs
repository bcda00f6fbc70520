//! Layout run configuration
//!
//! Defaults match the engine's tuning: live incremental updates, fit at
//! start and end, a 4 second simulation ceiling, and the stock physics
//! coefficients. Mass and rest length can be given as constants or computed
//! per element; both are resolved exactly once, at run construction.

use std::time::Duration;

use crate::error::{LayoutError, LayoutResult};
use crate::host::{EdgeSnapshot, NodeSnapshot};
use crate::mapper::{BoundingRect, Padding};
use crate::sim::{
    DEFAULT_FPS, DEFAULT_FRICTION, DEFAULT_PRECISION, DEFAULT_REPULSION, DEFAULT_STIFFNESS,
    DEFAULT_TIMESTEP, Energy, GRAVITY_REPULSION_RATIO, PhysicsParams,
};

/// Default hard ceiling on total run duration
pub const DEFAULT_MAX_SIMULATION_TIME: Duration = Duration::from_millis(4000);

/// Run-wide context passed to computed mass/length functions
#[derive(Debug, Clone, Copy)]
pub struct GraphContext {
    pub node_count: usize,
    pub edge_count: usize,
}

/// A per-element numeric value: engine default, a constant, or a function
/// of the element and the run-wide context
pub enum ValueSpec<T> {
    /// Fall back to the engine default
    Default,
    Constant(f64),
    Computed(Box<dyn Fn(&T, &GraphContext) -> f64>),
}

impl<T> ValueSpec<T> {
    /// Build a computed spec from a closure
    pub fn computed(f: impl Fn(&T, &GraphContext) -> f64 + 'static) -> Self {
        ValueSpec::Computed(Box::new(f))
    }

    /// Resolve the value for one element. `None` means "use the engine
    /// default", which callers interpret in their own units.
    pub fn resolve(&self, element: &T, context: &GraphContext) -> Option<f64> {
        match self {
            ValueSpec::Default => None,
            ValueSpec::Constant(v) => Some(*v),
            ValueSpec::Computed(f) => Some(f(element, context)),
        }
    }
}

impl<T> Default for ValueSpec<T> {
    fn default() -> Self {
        ValueSpec::Default
    }
}

/// Default stabilization predicate: stable when the peak kinetic energy or
/// the mean kinetic energy falls below its threshold
pub fn default_stable_energy(energy: &Energy) -> bool {
    energy.max <= 0.5 || energy.mean <= 0.3
}

/// Configuration for one layout run
pub struct LayoutOptions {
    /// Write positions back incrementally while running; otherwise a single
    /// final write-back happens at stop
    pub live_update: bool,
    /// Request a viewport reset/fit at run start (with live updates) or as
    /// part of the single final write-back (without)
    pub fit: bool,
    /// Insets reserved inside the bounding rectangle for the renderer
    pub padding: Padding,
    /// Hard wall-clock ceiling on the run; the system is force-stopped when
    /// it expires
    pub max_simulation_time: Duration,
    /// Disable the host's drag-to-grab behavior for the run's duration
    pub ungrabify_while_simulating: bool,
    /// Explicit screen-space bounding rectangle; derived from the viewport
    /// at origin (0, 0) when absent
    pub simulation_bounds: Option<BoundingRect>,

    pub repulsion: f64,
    pub stiffness: f64,
    pub friction: f64,
    pub gravity: bool,
    /// Tick rate of the cooperative schedule
    pub fps: f64,
    /// Integration precision in [0, 1]; finer precision uses more substeps
    pub precision: f64,
    /// Integration timestep per tick
    pub step_size: f64,

    /// Particle mass per node; constants and computed values are in the
    /// same unit as the default mass
    pub node_mass: ValueSpec<NodeSnapshot>,
    /// Spring rest length per edge; constants and computed values are in
    /// screen units and converted through the mapper scale
    pub edge_length: ValueSpec<EdgeSnapshot>,

    /// Stabilization predicate over the energy summary; `None` disables
    /// energy-based termination (the time ceiling still applies)
    pub stable_energy: Option<Box<dyn Fn(&Energy) -> bool>>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            live_update: true,
            fit: true,
            padding: Padding::default(),
            max_simulation_time: DEFAULT_MAX_SIMULATION_TIME,
            ungrabify_while_simulating: true,
            simulation_bounds: None,
            repulsion: DEFAULT_REPULSION,
            stiffness: DEFAULT_STIFFNESS,
            friction: DEFAULT_FRICTION,
            gravity: true,
            fps: DEFAULT_FPS,
            precision: DEFAULT_PRECISION,
            step_size: DEFAULT_TIMESTEP,
            node_mass: ValueSpec::Default,
            edge_length: ValueSpec::Default,
            stable_energy: Some(Box::new(default_stable_energy)),
        }
    }
}

impl LayoutOptions {
    /// Fail-fast validation, run before anything else when a layout starts
    pub fn validate(&self) -> LayoutResult<()> {
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(LayoutError::InvalidStepSize(self.step_size));
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(LayoutError::InvalidFps(self.fps));
        }
        if !(self.precision.is_finite() && (0.0..=1.0).contains(&self.precision)) {
            return Err(LayoutError::InvalidPrecision(self.precision));
        }
        if !(self.friction.is_finite() && (0.0..=1.0).contains(&self.friction)) {
            return Err(LayoutError::InvalidFriction(self.friction));
        }
        for (name, value) in [("repulsion", self.repulsion), ("stiffness", self.stiffness)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LayoutError::InvalidCoefficient { name, value });
            }
        }
        if self.max_simulation_time.is_zero() {
            return Err(LayoutError::InvalidMaxSimulationTime);
        }
        self.padding.validate()?;
        Ok(())
    }

    /// Physics parameters derived from the tuning options, still in
    /// screen-calibrated units. The gravity strength is fixed here so a
    /// later unit conversion of the repulsion coefficient does not weaken
    /// the centroid pull.
    pub fn physics(&self) -> PhysicsParams {
        PhysicsParams {
            repulsion: self.repulsion,
            stiffness: self.stiffness,
            friction: self.friction,
            gravity: self.gravity,
            gravity_strength: self.repulsion * GRAVITY_REPULSION_RATIO,
            timestep: self.step_size,
            substeps: PhysicsParams::substeps_for_precision(self.precision),
        }
    }

    /// Interval between ticks of the cooperative schedule
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ScreenPoint;

    #[test]
    fn defaults_validate() {
        assert!(LayoutOptions::default().validate().is_ok());
    }

    #[test]
    fn non_positive_step_size_is_rejected() {
        let options = LayoutOptions {
            step_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(LayoutError::InvalidStepSize(_))
        ));

        let options = LayoutOptions {
            step_size: f64::NAN,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn out_of_range_precision_is_rejected() {
        let options = LayoutOptions {
            precision: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(LayoutError::InvalidPrecision(_))
        ));
    }

    #[test]
    fn out_of_range_friction_is_rejected() {
        let options = LayoutOptions {
            friction: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(LayoutError::InvalidFriction(_))
        ));
    }

    #[test]
    fn negative_coefficient_is_rejected() {
        let options = LayoutOptions {
            repulsion: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(LayoutError::InvalidCoefficient {
                name: "repulsion",
                ..
            })
        ));
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let options = LayoutOptions {
            max_simulation_time: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(LayoutError::InvalidMaxSimulationTime)
        ));
    }

    #[test]
    fn negative_padding_is_rejected() {
        let options = LayoutOptions {
            padding: Padding::new(-1.0, 0.0, 0.0, 0.0),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(LayoutError::InvalidPadding { .. })
        ));
    }

    #[test]
    fn value_spec_resolution() {
        let ctx = GraphContext {
            node_count: 3,
            edge_count: 2,
        };
        let node = NodeSnapshot::new("a", ScreenPoint::new(0.0, 0.0));

        let spec: ValueSpec<NodeSnapshot> = ValueSpec::Default;
        assert_eq!(spec.resolve(&node, &ctx), None);

        let spec: ValueSpec<NodeSnapshot> = ValueSpec::Constant(2.5);
        assert_eq!(spec.resolve(&node, &ctx), Some(2.5));

        let spec = ValueSpec::computed(|n: &NodeSnapshot, ctx| {
            n.id.len() as f64 + ctx.node_count as f64
        });
        assert_eq!(spec.resolve(&node, &ctx), Some(4.0));
    }

    #[test]
    fn default_predicate_thresholds() {
        let stable = Energy {
            max: 0.5,
            mean: 0.4,
            count: 3,
        };
        assert!(default_stable_energy(&stable));

        let stable = Energy {
            max: 2.0,
            mean: 0.3,
            count: 3,
        };
        assert!(default_stable_energy(&stable));

        let unstable = Energy {
            max: 2.0,
            mean: 0.9,
            count: 3,
        };
        assert!(!default_stable_energy(&unstable));
    }

    #[test]
    fn tick_interval_follows_fps() {
        let options = LayoutOptions {
            fps: 50.0,
            ..Default::default()
        };
        assert_eq!(options.tick_interval(), Duration::from_millis(20));
    }
}
