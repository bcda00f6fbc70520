//! Layout run orchestration
//!
//! [`LayoutDriver`] validates configuration and builds a [`LayoutRun`] from a
//! host graph snapshot. The run is a cooperative state machine: the host (or
//! [`LayoutRun::run_to_completion`] for headless use) pumps it with
//! [`LayoutRun::frame`], and each frame ticks the particle system at the
//! configured cadence, checks the stabilization predicate and the wall-clock
//! ceiling, writes positions back, and fires lifecycle events. Everything
//! happens on the caller's thread; there is no data race between a tick and
//! its write-back because a frame runs to completion before the next one is
//! scheduled.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::LayoutOptions;
use crate::drag::DragBridge;
use crate::error::{LayoutError, LayoutResult};
use crate::host::{DragEvent, GraphSnapshot, Host, NodeId, ViewportSize};
use crate::mapper::{BoundingRect, CoordinateMapper, ScreenPoint};
use crate::sim::{
    DEFAULT_EDGE_LENGTH, DEFAULT_NODE_MASS, EdgeAttrs, Energy, NodeAttrs, ParticleSystem,
};

/// Minimum wall-clock gap between host-visible redraw notifications
pub const REDRAW_INTERVAL: Duration = Duration::from_millis(16);

/// Validates options and starts layout runs
pub struct LayoutDriver {
    options: LayoutOptions,
}

impl LayoutDriver {
    /// Create a driver, failing fast on invalid configuration
    pub fn new(options: LayoutOptions) -> LayoutResult<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Start a run over a snapshot of the host graph.
    ///
    /// Configuration and construction errors are reported synchronously and
    /// the run never starts (no events fire). A graph with zero or one node
    /// short-circuits: the sole unlocked node (if any) is centered on the
    /// bounding rectangle and the returned run is already finished, with
    /// exactly one "stopped" event emitted.
    pub fn start(
        self,
        graph: &GraphSnapshot,
        viewport: ViewportSize,
        host: &mut dyn Host,
        now: Instant,
    ) -> LayoutResult<LayoutRun> {
        let bounds = match self.options.simulation_bounds {
            Some(bounds) => bounds,
            None => BoundingRect::new(0.0, 0.0, viewport.width, viewport.height)?,
        };
        let mapper = CoordinateMapper::new(bounds, self.options.padding);

        if graph.nodes.len() <= 1 {
            return self.finish_degenerate(graph, mapper, host, now);
        }

        let context = graph.context();
        // Tuning coefficients are calibrated against screen-unit geometry;
        // convert them for the simulation box before any forces run
        let mut system = ParticleSystem::new(self.options.physics().in_sim_units(mapper.scale()));

        for node in &graph.nodes {
            if node.locked {
                continue;
            }
            let mass = match self.options.node_mass.resolve(node, &context) {
                Some(value) => {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(LayoutError::InvalidNodeMass {
                            id: node.id.clone(),
                            value,
                        });
                    }
                    value
                }
                None => DEFAULT_NODE_MASS,
            };
            system.add_node(&node.id, NodeAttrs::default().with_mass(mass))?;
        }

        for edge in &graph.edges {
            if !system.contains(&edge.source) || !system.contains(&edge.target) {
                // Endpoint locked (or unknown to the run); an immovable
                // endpoint makes the spring moot
                trace!(edge = %edge.id, "skipping edge with excluded endpoint");
                continue;
            }
            let length = match self.options.edge_length.resolve(edge, &context) {
                Some(value) => {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(LayoutError::InvalidEdgeLength {
                            id: edge.id.clone(),
                            value,
                        });
                    }
                    // Configured lengths are in screen units
                    value / mapper.scale()
                }
                None => DEFAULT_EDGE_LENGTH,
            };
            system.add_edge(
                &edge.source,
                &edge.target,
                EdgeAttrs::default().with_length(length),
            )?;
        }

        if system.node_count() == 0 {
            // Every node is locked; nothing to simulate
            return self.finish_degenerate(&GraphSnapshot::default(), mapper, host, now);
        }

        let mut bridge = DragBridge::new();
        for node in &graph.nodes {
            if node.grabbed && !node.locked {
                bridge.handle(
                    &DragEvent::Grab {
                        id: node.id.clone(),
                        position: node.position,
                    },
                    &mut system,
                    &mapper,
                );
            }
        }

        if self.options.ungrabify_while_simulating {
            host.set_dragging_enabled(false);
        }
        if self.options.live_update && self.options.fit {
            host.fit_viewport();
        }

        system.start();
        debug!(
            nodes = system.node_count(),
            edges = system.edge_count(),
            "layout run started"
        );

        let tick_interval = self.options.tick_interval();
        Ok(LayoutRun {
            options: self.options,
            system,
            mapper,
            bridge,
            started_at: now,
            next_tick_at: now,
            tick_interval,
            last_draw: None,
            ready_fired: false,
            finished: false,
        })
    }

    /// Degenerate 0/1-node path: no simulation, one synchronous terminal
    /// event
    fn finish_degenerate(
        self,
        graph: &GraphSnapshot,
        mapper: CoordinateMapper,
        host: &mut dyn Host,
        now: Instant,
    ) -> LayoutResult<LayoutRun> {
        if self.options.fit {
            host.fit_viewport();
        }
        if let Some(node) = graph.nodes.first() {
            if !node.locked {
                host.set_node_position(&node.id, mapper.bounds().midpoint_rounded());
                host.positions_changed(&[node.id.clone()]);
            }
        }
        debug!("degenerate graph; layout stopped synchronously");
        host.layout_stopped();

        let tick_interval = self.options.tick_interval();
        Ok(LayoutRun {
            system: ParticleSystem::new(self.options.physics()),
            options: self.options,
            mapper,
            bridge: DragBridge::new(),
            started_at: now,
            next_tick_at: now,
            tick_interval,
            last_draw: None,
            ready_fired: false,
            finished: true,
        })
    }
}

/// A layout run in progress
///
/// The host pumps the run with [`frame`](LayoutRun::frame) from its
/// scheduler and forwards drag gestures through
/// [`handle_drag`](LayoutRun::handle_drag). The run finishes when the
/// stabilization predicate holds, the time ceiling expires, or
/// [`stop`](LayoutRun::stop) is called, whichever comes first; the terminal
/// event fires exactly once regardless of cause.
pub struct LayoutRun {
    options: LayoutOptions,
    system: ParticleSystem,
    mapper: CoordinateMapper,
    bridge: DragBridge,
    started_at: Instant,
    next_tick_at: Instant,
    tick_interval: Duration,
    last_draw: Option<Instant>,
    ready_fired: bool,
    finished: bool,
}

impl LayoutRun {
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Energy summary from the most recent tick
    pub fn energy(&self) -> Energy {
        self.system.energy()
    }

    pub fn bounds(&self) -> &BoundingRect {
        self.mapper.bounds()
    }

    /// Drawing area left inside the bounds after the configured padding
    /// insets; what a fit request should target
    pub fn usable_area(&self) -> BoundingRect {
        self.mapper.usable_area()
    }

    /// Current screen-space position of a simulated node
    pub fn screen_position(&self, id: &str) -> Option<ScreenPoint> {
        self.system.position(id).map(|p| self.mapper.to_screen(p))
    }

    /// Advance the run. Ticks fire at the configured fps cadence; calling
    /// more often is harmless and calling after the run finished is a
    /// no-op.
    pub fn frame(&mut self, now: Instant, host: &mut dyn Host) {
        if self.finished {
            return;
        }

        if self.system.is_running()
            && now.duration_since(self.started_at) >= self.options.max_simulation_time
        {
            debug!("max simulation time reached; force-stopping");
            self.system.stop();
        }

        if self.system.is_running() && now >= self.next_tick_at {
            self.system.tick();
            self.next_tick_at = now + self.tick_interval;
            self.bridge.settle();

            let energy = self.system.energy();
            trace!(
                max = energy.max,
                mean = energy.mean,
                count = energy.count,
                "tick"
            );
            if let Some(predicate) = &self.options.stable_energy {
                if energy.count > 0 && predicate(&energy) {
                    debug!(max = energy.max, mean = energy.mean, "layout stabilized");
                    self.system.stop();
                }
            }

            self.write_back(now, host);
            if !self.ready_fired {
                self.ready_fired = true;
                host.layout_ready();
            }
        }

        if !self.system.is_running() {
            self.finalize(host);
        }
    }

    /// Forward a drag gesture from the host
    pub fn handle_drag(&mut self, event: &DragEvent) {
        if self.finished {
            return;
        }
        self.bridge.handle(event, &mut self.system, &self.mapper);
    }

    /// Stop the run externally. Idempotent: repeated calls after the run
    /// finished have no observable effect and fire no further events.
    pub fn stop(&mut self, host: &mut dyn Host) {
        if self.finished {
            return;
        }
        debug!("layout stop requested");
        self.system.stop();
        self.finalize(host);
    }

    /// Headless driver: advances a synthetic clock at the tick cadence
    /// until the run finishes. Bounded by the simulation time ceiling.
    pub fn run_to_completion(&mut self, host: &mut dyn Host) {
        let step = self.tick_interval.max(Duration::from_micros(1));
        let mut now = self.started_at;
        while !self.finished {
            now += step;
            self.frame(now, host);
        }
    }

    /// Write this tick's positions to the host. Locked nodes have no
    /// particle and grabbed nodes belong to the drag bridge, so neither is
    /// touched. Visible redraw notifications are throttled; authoritative
    /// position updates are not.
    fn write_back(&mut self, now: Instant, host: &mut dyn Host) {
        let mut moved: Vec<NodeId> = Vec::new();
        for particle in self.system.particles() {
            if particle.fixed || self.bridge.is_grabbed(&particle.id) {
                continue;
            }
            host.set_node_position(&particle.id, self.mapper.to_screen(particle.position()));
            moved.push(particle.id.clone());
        }

        let draw_due = match self.last_draw {
            None => true,
            Some(last) => now.duration_since(last) >= REDRAW_INTERVAL,
        };
        if self.options.live_update && !moved.is_empty() && draw_due {
            host.positions_changed(&moved);
            self.last_draw = Some(now);
        }
    }

    /// Terminal path, entered exactly once per started run
    fn finalize(&mut self, host: &mut dyn Host) {
        if self.finished {
            return;
        }
        self.finished = true;

        if !self.options.live_update {
            let mut moved: Vec<NodeId> = Vec::new();
            for particle in self.system.particles() {
                if particle.fixed || self.bridge.is_grabbed(&particle.id) {
                    continue;
                }
                host.set_node_position(&particle.id, self.mapper.to_screen(particle.position()));
                moved.push(particle.id.clone());
            }
            if self.options.fit {
                host.fit_viewport();
            }
            if !moved.is_empty() {
                host.positions_changed(&moved);
            }
        }

        if self.options.ungrabify_while_simulating {
            host.set_dragging_enabled(true);
        }

        debug!("layout run stopped");
        host.layout_stopped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EdgeSnapshot, NodeSnapshot};

    /// Host that counts every callback
    #[derive(Default)]
    struct CountingHost {
        positions: std::collections::HashMap<String, ScreenPoint>,
        position_writes: usize,
        redraws: usize,
        fits: usize,
        ready_events: usize,
        stopped_events: usize,
        dragging_enabled: Option<bool>,
    }

    impl Host for CountingHost {
        fn set_node_position(&mut self, id: &str, position: ScreenPoint) {
            self.positions.insert(id.to_string(), position);
            self.position_writes += 1;
        }

        fn positions_changed(&mut self, _moved: &[NodeId]) {
            self.redraws += 1;
        }

        fn fit_viewport(&mut self) {
            self.fits += 1;
        }

        fn set_dragging_enabled(&mut self, enabled: bool) {
            self.dragging_enabled = Some(enabled);
        }

        fn layout_ready(&mut self) {
            self.ready_events += 1;
        }

        fn layout_stopped(&mut self) {
            self.stopped_events += 1;
        }
    }

    fn viewport() -> ViewportSize {
        ViewportSize::new(400.0, 300.0)
    }

    fn pair_graph() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![
                NodeSnapshot::new("a", ScreenPoint::new(100.0, 100.0)),
                NodeSnapshot::new("b", ScreenPoint::new(300.0, 200.0)),
            ],
            edges: vec![EdgeSnapshot::new("ab", "a", "b")],
        }
    }

    #[test]
    fn empty_graph_stops_synchronously() {
        let mut host = CountingHost::default();
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        let run = driver
            .start(&GraphSnapshot::default(), viewport(), &mut host, Instant::now())
            .unwrap();

        assert!(run.is_finished());
        assert_eq!(host.stopped_events, 1);
        assert_eq!(host.ready_events, 0);
        assert_eq!(host.position_writes, 0);
    }

    #[test]
    fn single_node_is_centered() {
        let mut host = CountingHost::default();
        let graph = GraphSnapshot {
            nodes: vec![NodeSnapshot::new("only", ScreenPoint::new(13.0, 37.0))],
            edges: vec![],
        };
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        let run = driver
            .start(&graph, viewport(), &mut host, Instant::now())
            .unwrap();

        assert!(run.is_finished());
        assert_eq!(host.stopped_events, 1);
        assert_eq!(
            host.positions.get("only"),
            Some(&ScreenPoint::new(200.0, 150.0))
        );
    }

    #[test]
    fn single_locked_node_is_untouched() {
        let mut host = CountingHost::default();
        let graph = GraphSnapshot {
            nodes: vec![NodeSnapshot::new("pinned", ScreenPoint::new(5.0, 5.0)).locked()],
            edges: vec![],
        };
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        driver
            .start(&graph, viewport(), &mut host, Instant::now())
            .unwrap();

        assert_eq!(host.stopped_events, 1);
        assert!(host.positions.is_empty());
    }

    #[test]
    fn all_locked_graph_stops_without_simulating() {
        let mut host = CountingHost::default();
        let graph = GraphSnapshot {
            nodes: vec![
                NodeSnapshot::new("a", ScreenPoint::new(0.0, 0.0)).locked(),
                NodeSnapshot::new("b", ScreenPoint::new(10.0, 10.0)).locked(),
            ],
            edges: vec![],
        };
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        let run = driver
            .start(&graph, viewport(), &mut host, Instant::now())
            .unwrap();

        assert!(run.is_finished());
        assert_eq!(host.stopped_events, 1);
        assert!(host.positions.is_empty());
    }

    #[test]
    fn zero_viewport_without_bounds_is_rejected() {
        let mut host = CountingHost::default();
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        let err = driver.start(
            &pair_graph(),
            ViewportSize::new(0.0, 300.0),
            &mut host,
            Instant::now(),
        );
        assert!(matches!(err, Err(LayoutError::DegenerateBounds { .. })));
        assert_eq!(host.stopped_events, 0, "a rejected run fires no events");
    }

    #[test]
    fn invalid_computed_mass_is_rejected_before_start() {
        let mut host = CountingHost::default();
        let options = LayoutOptions {
            node_mass: crate::config::ValueSpec::computed(|_, _| f64::NAN),
            ..Default::default()
        };
        let driver = LayoutDriver::new(options).unwrap();
        let err = driver.start(&pair_graph(), viewport(), &mut host, Instant::now());
        assert!(matches!(err, Err(LayoutError::InvalidNodeMass { .. })));
        assert_eq!(host.stopped_events, 0);
    }

    #[test]
    fn run_fires_ready_then_stopped_once() {
        let mut host = CountingHost::default();
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        let mut run = driver
            .start(&pair_graph(), viewport(), &mut host, Instant::now())
            .unwrap();

        run.run_to_completion(&mut host);
        assert!(run.is_finished());
        assert_eq!(host.ready_events, 1);
        assert_eq!(host.stopped_events, 1);
        assert!(host.position_writes > 0);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut host = CountingHost::default();
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        let now = Instant::now();
        let mut run = driver.start(&pair_graph(), viewport(), &mut host, now).unwrap();

        run.stop(&mut host);
        assert_eq!(host.stopped_events, 1);

        run.stop(&mut host);
        run.stop(&mut host);
        run.frame(now + Duration::from_secs(10), &mut host);
        assert_eq!(host.stopped_events, 1);
    }

    #[test]
    fn ceiling_forces_termination_with_predicate_disabled() {
        let mut host = CountingHost::default();
        let options = LayoutOptions {
            stable_energy: None,
            max_simulation_time: Duration::from_millis(200),
            ..Default::default()
        };
        let driver = LayoutDriver::new(options).unwrap();
        let mut run = driver
            .start(&pair_graph(), viewport(), &mut host, Instant::now())
            .unwrap();

        run.run_to_completion(&mut host);
        assert!(run.is_finished());
        assert_eq!(host.stopped_events, 1);
    }

    #[test]
    fn dragging_is_suspended_and_restored() {
        let mut host = CountingHost::default();
        let driver = LayoutDriver::new(LayoutOptions::default()).unwrap();
        let mut run = driver
            .start(&pair_graph(), viewport(), &mut host, Instant::now())
            .unwrap();
        assert_eq!(host.dragging_enabled, Some(false));

        run.run_to_completion(&mut host);
        assert_eq!(host.dragging_enabled, Some(true));
    }

    #[test]
    fn final_write_back_when_live_update_disabled() {
        let mut host = CountingHost::default();
        let options = LayoutOptions {
            live_update: false,
            max_simulation_time: Duration::from_millis(100),
            ..Default::default()
        };
        let driver = LayoutDriver::new(options).unwrap();
        let mut run = driver
            .start(&pair_graph(), viewport(), &mut host, Instant::now())
            .unwrap();

        run.run_to_completion(&mut host);
        // Positions were written every tick, but redraw notifications only
        // at finalization
        assert_eq!(host.redraws, 1);
        assert!(host.positions.contains_key("a"));
        assert!(host.positions.contains_key("b"));
    }

    #[test]
    fn usable_area_reflects_configured_padding() {
        let mut host = CountingHost::default();
        let options = LayoutOptions {
            padding: crate::mapper::Padding::new(10.0, 20.0, 30.0, 40.0),
            ..Default::default()
        };
        let driver = LayoutDriver::new(options).unwrap();
        let run = driver
            .start(&pair_graph(), viewport(), &mut host, Instant::now())
            .unwrap();

        let area = run.usable_area();
        assert_eq!(area.x1, 40.0);
        assert_eq!(area.y1, 10.0);
        assert_eq!(area.x2, 380.0);
        assert_eq!(area.y2, 270.0);
    }

    #[test]
    fn frames_before_tick_deadline_do_not_tick() {
        let mut host = CountingHost::default();
        let options = LayoutOptions {
            fps: 10.0, // 100ms interval
            ..Default::default()
        };
        let driver = LayoutDriver::new(options).unwrap();
        let now = Instant::now();
        let mut run = driver.start(&pair_graph(), viewport(), &mut host, now).unwrap();

        run.frame(now + Duration::from_millis(1), &mut host);
        let writes = host.position_writes;
        assert!(writes > 0, "first frame ticks immediately");

        // Within the same 100ms window: no further tick
        run.frame(now + Duration::from_millis(2), &mut host);
        assert_eq!(host.position_writes, writes);
    }
}
