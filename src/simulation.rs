use crate::builder::{BuildError, GridBuilder};
use crate::config::SimConfig;
use crate::network::RoadNetwork;
use crate::policy::{Policy, PolicyKind};
use crate::vehicle::Vehicle;
use crate::{IntersectionId, LaneId, RoadId, VehicleId, VehicleSet};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// A complete simulation: the network, its vehicles, the scheduling policy
/// and the tick clock.
///
/// Each tick runs, in strict order, the policy for every light-controlled
/// intersection, then every road, then every lane. Lights must be decided
/// before lane flow is evaluated, and lane flow before the next tick's road
/// advance, so a vehicle never skips two hops in one tick.
pub struct Simulation {
    /// The road network.
    network: RoadNetwork,
    /// The vehicles, finished ones included.
    vehicles: VehicleSet,
    /// The scheduling policy.
    policy: Policy,
    /// The simulation RNG; every random choice is drawn from it.
    rng: ChaCha8Rng,
    /// Completed ticks.
    tick: usize,
    /// Vehicles still on the network.
    active: usize,
    /// Base green-lane discharge capacity per tick.
    flow_capacity: usize,
    /// Per-tick perturbation of the discharge capacity.
    flow_jitter: Normal<f64>,
}

/// Aggregate results over a run's finished vehicles.
///
/// This is a pure function of the vehicle counters; nothing here is
/// computed inside the tick loop.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    /// Vehicles that completed their trip.
    pub finished: usize,
    /// Mean ticks spent moving.
    pub mean_steps_driving: f64,
    /// Mean ticks spent waiting in lane queues.
    pub mean_steps_waiting: f64,
    /// Mean number of light-controlled lanes encountered.
    pub mean_lights_encountered: f64,
    /// Mean tick at which vehicles finished.
    pub mean_steps_to_destination: f64,
    /// Mean waiting ticks per encountered light, over the vehicles that met
    /// at least one light.
    pub score: f64,
}

impl Simulation {
    /// Creates a simulation from an already built network and population.
    ///
    /// The policy's one-time setup runs here, before the first tick.
    pub fn new(
        network: RoadNetwork,
        vehicles: VehicleSet,
        mut policy: Policy,
        config: &SimConfig,
        mut rng: ChaCha8Rng,
    ) -> Self {
        policy.setup(&network, &mut rng);
        let active = vehicles.values().filter(|v| !v.is_finished()).count();
        Self {
            network,
            vehicles,
            policy,
            rng,
            tick: 0,
            active,
            flow_capacity: config.flow_capacity,
            flow_jitter: Normal::new(0.0, config.flow_jitter).expect("invalid flow jitter"),
        }
    }

    /// Builds a network from the configuration and wires up the policy.
    pub fn from_config(config: &SimConfig, kind: PolicyKind) -> Result<Self, BuildError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let (network, vehicles) = GridBuilder::new(config).build(&mut rng)?;
        Ok(Self::new(network, vehicles, Policy::new(kind), config, rng))
    }

    /// Advances the simulation by one tick.
    ///
    /// Returns the number of vehicles that finished their trip this tick.
    pub fn step(&mut self) -> usize {
        self.update_policies();
        let finished = self.update_roads();
        self.update_lanes();
        self.tick += 1;
        self.active -= finished;
        finished
    }

    /// Runs until every vehicle has finished, then returns the summary.
    pub fn run(&mut self) -> RunSummary {
        while self.active > 0 {
            self.step();
        }
        log::debug!(
            "{:?} run complete after {} ticks",
            self.policy.kind(),
            self.tick
        );
        self.summary()
    }

    /// The number of completed ticks.
    pub fn tick(&self) -> usize {
        self.tick
    }

    /// The number of vehicles still on the network.
    pub fn active_vehicles(&self) -> usize {
        self.active
    }

    /// Gets the road network.
    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Gets a reference to the vehicle with the given ID.
    pub fn get_vehicle(&self, id: VehicleId) -> &Vehicle {
        &self.vehicles[id]
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values()
    }

    /// Computes the run summary over the vehicles finished so far.
    pub fn summary(&self) -> RunSummary {
        let finished: Vec<&Vehicle> = self
            .vehicles
            .values()
            .filter(|v| v.is_finished())
            .collect();
        let scored: Vec<f64> = finished
            .iter()
            .filter(|v| v.lights_encountered() > 0)
            .map(|v| v.steps_waiting() as f64 / v.lights_encountered() as f64)
            .collect();
        RunSummary {
            finished: finished.len(),
            mean_steps_driving: mean(finished.iter().map(|v| v.steps_driving() as f64)),
            mean_steps_waiting: mean(finished.iter().map(|v| v.steps_waiting() as f64)),
            mean_lights_encountered: mean(finished.iter().map(|v| v.lights_encountered() as f64)),
            mean_steps_to_destination: mean(
                finished.iter().filter_map(|v| v.finished_at()).map(|t| t as f64),
            ),
            score: mean(scored.into_iter()),
        }
    }

    /// Runs the policy for each light-controlled intersection whose period
    /// is due this tick, and checks the safety contract behind it.
    fn update_policies(&mut self) {
        let due: Vec<IntersectionId> = self
            .network
            .iter_intersections()
            .filter(|(_, i)| i.has_traffic_lights() && self.tick % i.light_period() == 0)
            .map(|(id, _)| id)
            .collect();
        for id in due {
            self.policy.update(&mut self.network, id, &mut self.rng);
            debug_assert!(
                self.network.greens_compatible(id),
                "policy granted conflicting greens"
            );
        }
    }

    /// Advances every road by one section.
    fn update_roads(&mut self) -> usize {
        let now = self.tick + 1;
        let roads: Vec<RoadId> = self.network.iter_roads().map(|(id, _)| id).collect();
        let mut finished = 0;
        for road_id in roads {
            finished += self
                .network
                .update_road(road_id, &mut self.vehicles, &mut self.rng, now);
        }
        finished
    }

    /// Discharges open lanes and counts waiting steps.
    fn update_lanes(&mut self) {
        let lanes: Vec<LaneId> = self.network.iter_lanes().map(|(id, _)| id).collect();
        for lane_id in lanes {
            let flow = self.draw_flow();
            self.network.update_lane(lane_id, &mut self.vehicles, flow);
        }
    }

    /// The number of vehicles a green lane may discharge this tick.
    fn draw_flow(&mut self) -> usize {
        let flow = self.flow_capacity as f64 + self.flow_jitter.sample(&mut self.rng);
        flow.round().max(0.0) as usize
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
