//! Error types for layout construction and configuration

use thiserror::Error;

/// Errors that can occur while validating configuration or building a run
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The bounding rectangle has no usable area
    #[error("bounding rectangle has zero or negative area: [{x1}, {y1}, {x2}, {y2}]")]
    DegenerateBounds { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// A bounding rectangle coordinate is NaN or infinite
    #[error("bounding rectangle coordinate is not finite: [{x1}, {y1}, {x2}, {y2}]")]
    NonFiniteBounds { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// A padding inset is negative or not finite
    #[error("padding insets must be non-negative finite numbers: [{top}, {right}, {bottom}, {left}]")]
    InvalidPadding {
        top: f64,
        right: f64,
        bottom: f64,
        left: f64,
    },

    /// The integration timestep is unusable
    #[error("step size must be a positive finite number, got {0}")]
    InvalidStepSize(f64),

    /// The tick rate is unusable
    #[error("fps must be a positive finite number, got {0}")]
    InvalidFps(f64),

    /// The integration precision is out of range
    #[error("precision must be in [0, 1], got {0}")]
    InvalidPrecision(f64),

    /// A physics coefficient is out of range
    #[error("{name} must be a non-negative finite number, got {value}")]
    InvalidCoefficient { name: &'static str, value: f64 },

    /// The friction coefficient is out of range
    #[error("friction must be in [0, 1], got {0}")]
    InvalidFriction(f64),

    /// The run duration ceiling is unusable
    #[error("max simulation time must be positive")]
    InvalidMaxSimulationTime,

    /// A resolved node mass is unusable
    #[error("node mass for '{id}' must be a positive finite number, got {value}")]
    InvalidNodeMass { id: String, value: f64 },

    /// A resolved edge rest length is unusable
    #[error("edge length for '{id}' must be a positive finite number, got {value}")]
    InvalidEdgeLength { id: String, value: f64 },

    /// A node id was added to the particle system twice
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    /// An edge references a node id the particle system does not know
    #[error("edge '{id}' references unknown node '{node}'")]
    UnknownEdgeEndpoint { id: String, node: String },

    /// A fixed particle was added without an initial position
    #[error("fixed node '{0}' requires an initial position")]
    FixedWithoutPosition(String),
}

/// Result type for layout operations
pub type LayoutResult<T> = Result<T, LayoutError>;
