//! The particle system: force resolution and integration
//!
//! An O(n²) solver combining many-body repulsion, spring attraction along
//! edges, optional centroid gravity, and friction damping. Each tick advances
//! one timestep, split into substeps according to the configured precision.
//! Fixed and pinned particles are skipped by the integrator but still exert
//! forces on everything else.

use std::collections::HashMap;

use crate::error::{LayoutError, LayoutResult};
use crate::mapper::SimPoint;
use crate::sim::types::{
    DISTANCE_MIN, EdgeAttrs, Energy, MAX_FORCE, MAX_VELOCITY, NodeAttrs, Particle, PhysicsParams,
    RELEASE_MASS, RELEASE_MASS_DECAY, SEED_RADIUS, Spring,
};

/// Golden angle in radians, used for deterministic seeding
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Mutable particle-and-spring model advanced by discrete timesteps
pub struct ParticleSystem {
    particles: Vec<Particle>,
    springs: Vec<Spring>,
    index: HashMap<String, usize>,
    params: PhysicsParams,
    running: bool,
    energy: Energy,
    forces: Vec<(f64, f64)>,
}

impl ParticleSystem {
    pub fn new(params: PhysicsParams) -> Self {
        Self {
            particles: Vec::new(),
            springs: Vec::new(),
            index: HashMap::new(),
            params,
            running: false,
            energy: Energy::default(),
            forces: Vec::new(),
        }
    }

    /// Add a particle. Duplicate ids are rejected; a fixed particle must
    /// come with an initial position. Particles without a position are
    /// seeded on a deterministic circle around the origin.
    pub fn add_node(&mut self, id: &str, attrs: NodeAttrs) -> LayoutResult<()> {
        if self.index.contains_key(id) {
            return Err(LayoutError::DuplicateNode(id.to_string()));
        }
        let position = match attrs.position {
            Some(p) => p,
            None if attrs.fixed => {
                return Err(LayoutError::FixedWithoutPosition(id.to_string()));
            }
            None => Self::seed_position(self.particles.len()),
        };

        let mut particle = Particle::new(id, position, attrs.mass);
        particle.fixed = attrs.fixed;

        self.index.insert(id.to_string(), self.particles.len());
        self.particles.push(particle);
        self.forces.push((0.0, 0.0));
        Ok(())
    }

    /// Add a spring between two existing particles. Parallel springs
    /// between the same pair are independent.
    pub fn add_edge(&mut self, source: &str, target: &str, attrs: EdgeAttrs) -> LayoutResult<()> {
        let lookup = |node: &str| {
            self.index
                .get(node)
                .copied()
                .ok_or_else(|| LayoutError::UnknownEdgeEndpoint {
                    id: format!("{source}->{target}"),
                    node: node.to_string(),
                })
        };
        let spring = Spring {
            source: lookup(source)?,
            target: lookup(target)?,
            length: attrs.length,
        };
        self.springs.push(spring);
        Ok(())
    }

    fn seed_position(index: usize) -> SimPoint {
        let angle = index as f64 * GOLDEN_ANGLE;
        SimPoint::new(SEED_RADIUS * angle.cos(), SEED_RADIUS * angle.sin())
    }

    pub fn node_count(&self) -> usize {
        self.particles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.springs.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn position(&self, id: &str) -> Option<SimPoint> {
        self.index.get(id).map(|&i| self.particles[i].position())
    }

    /// Begin the ticking schedule. No-op when already running.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Halt the ticking schedule. No-op when not running.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Aggregate energy summary reflecting the most recent tick
    pub fn energy(&self) -> Energy {
        self.energy
    }

    /// Hold a particle at the given point, excluding it from integration.
    /// Returns false for unknown ids.
    pub fn pin(&mut self, id: &str, point: SimPoint) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                let p = &mut self.particles[i];
                p.pinned = true;
                p.x = point.x;
                p.y = point.y;
                p.vx = 0.0;
                p.vy = 0.0;
                true
            }
            None => false,
        }
    }

    /// Release a pinned particle back into integration with a temporarily
    /// elevated mass, so it is not immediately flung away from where the
    /// user placed it. Returns false for unknown ids.
    pub fn release(&mut self, id: &str) -> bool {
        match self.index.get(id) {
            Some(&i) => {
                let p = &mut self.particles[i];
                p.pinned = false;
                p.mass = RELEASE_MASS.max(p.base_mass);
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by one timestep
    pub fn tick(&mut self) {
        let n = self.particles.len();
        if n == 0 {
            self.energy = Energy::default();
            return;
        }

        let substeps = self.params.substeps.max(1);
        let dt = self.params.timestep / substeps as f64;
        let damping = (1.0 - self.params.friction).powf(1.0 / substeps as f64);

        for _ in 0..substeps {
            for f in &mut self.forces {
                *f = (0.0, 0.0);
            }
            self.apply_repulsion();
            self.apply_springs();
            if self.params.gravity {
                self.apply_gravity();
            }
            self.integrate(dt, damping);
        }

        self.decay_release_mass();
        self.update_energy();
    }

    /// Pairwise repulsion, scaled by both masses and falling off with the
    /// squared distance. Distances are clamped to avoid the singularity at
    /// zero separation; exactly coincident particles get a deterministic
    /// nudge apart.
    fn apply_repulsion(&mut self) {
        let n = self.particles.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let mut dx = self.particles[j].x - self.particles[i].x;
                let mut dy = self.particles[j].y - self.particles[i].y;
                if dx * dx + dy * dy < 1e-12 {
                    dx = 1e-3 * ((j - i) as f64);
                    dy = 1e-3;
                }
                let dist = (dx * dx + dy * dy).sqrt().max(DISTANCE_MIN);
                let force = self.params.repulsion * self.particles[i].mass
                    * self.particles[j].mass
                    / (dist * dist);
                let fx = force * dx / dist;
                let fy = force * dy / dist;
                self.forces[i].0 -= fx;
                self.forces[i].1 -= fy;
                self.forces[j].0 += fx;
                self.forces[j].1 += fy;
            }
        }
    }

    /// Hooke attraction toward each spring's rest length
    fn apply_springs(&mut self) {
        for spring in &self.springs {
            let (s, t) = (spring.source, spring.target);
            let dx = self.particles[t].x - self.particles[s].x;
            let dy = self.particles[t].y - self.particles[s].y;
            let dist = (dx * dx + dy * dy).sqrt().max(DISTANCE_MIN);
            let stretch = dist - spring.length;
            let force = self.params.stiffness * stretch / dist;
            let fx = force * dx;
            let fy = force * dy;
            self.forces[s].0 += fx;
            self.forces[s].1 += fy;
            self.forces[t].0 -= fx;
            self.forces[t].1 -= fy;
        }
    }

    /// Weak pull toward the layout centroid, proportional to mass so the
    /// resulting acceleration is uniform
    fn apply_gravity(&mut self) {
        let n = self.particles.len() as f64;
        let cx = self.particles.iter().map(|p| p.x).sum::<f64>() / n;
        let cy = self.particles.iter().map(|p| p.y).sum::<f64>() / n;
        let strength = self.params.gravity_strength;
        for (i, p) in self.particles.iter().enumerate() {
            self.forces[i].0 += (cx - p.x) * strength * p.mass;
            self.forces[i].1 += (cy - p.y) * strength * p.mass;
        }
    }

    /// Euler step with force and velocity caps. A particle whose new state
    /// fails finiteness keeps its previous position for this substep.
    fn integrate(&mut self, dt: f64, damping: f64) {
        let forces = &self.forces;
        for (i, p) in self.particles.iter_mut().enumerate() {
            if p.fixed || p.pinned {
                p.vx = 0.0;
                p.vy = 0.0;
                continue;
            }

            let (mut fx, mut fy) = forces[i];
            let magnitude = (fx * fx + fy * fy).sqrt();
            if magnitude > MAX_FORCE {
                let scale = MAX_FORCE / magnitude;
                fx *= scale;
                fy *= scale;
            }

            let mut vx = (p.vx + fx / p.mass * dt) * damping;
            let mut vy = (p.vy + fy / p.mass * dt) * damping;
            let speed = (vx * vx + vy * vy).sqrt();
            if speed > MAX_VELOCITY {
                let scale = MAX_VELOCITY / speed;
                vx *= scale;
                vy *= scale;
            }

            let nx = p.x + vx * dt;
            let ny = p.y + vy * dt;
            if nx.is_finite() && ny.is_finite() && vx.is_finite() && vy.is_finite() {
                p.x = nx;
                p.y = ny;
                p.vx = vx;
                p.vy = vy;
            } else {
                p.vx = 0.0;
                p.vy = 0.0;
            }
        }
    }

    fn decay_release_mass(&mut self) {
        for p in &mut self.particles {
            if p.mass != p.base_mass {
                p.mass += (p.base_mass - p.mass) * RELEASE_MASS_DECAY;
                if (p.mass - p.base_mass).abs() < 0.01 * p.base_mass {
                    p.mass = p.base_mass;
                }
            }
        }
    }

    fn update_energy(&mut self) {
        let mut max = 0.0_f64;
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        for p in &self.particles {
            if p.is_held() {
                continue;
            }
            let ke = p.kinetic_energy();
            max = max.max(ke);
            sum += ke;
            count += 1;
        }
        self.energy = Energy {
            max,
            mean: if count > 0 { sum / count as f64 } else { 0.0 },
            count,
        };
    }
}
