use crate::config::SimConfig;
use crate::conflict::compatible;
use crate::geom::{Direction, Turning};
use crate::network::RoadNetwork;
use crate::vehicle::Vehicle;
use crate::{IntersectionId, LaneId, RoadId, VehicleSet};
use arrayvec::ArrayVec;
use itertools::Itertools;
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// The reasons network construction can fail.
///
/// These are configuration errors, not transient faults: when the repair
/// passes have reached a fixed point and an invariant still does not hold,
/// the probabilities or grid size cannot produce a valid network.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("the grid needs at least one intersection in each dimension")]
    EmptyGrid,
    #[error("the {0} probability must lie within 0.0..=1.0")]
    InvalidProbability(&'static str),
    #[error("invalid {0} range: min exceeds max")]
    InvalidRange(&'static str),
    #[error("vehicles must drive at least one road")]
    ZeroTripLength,
    #[error("the light period must be at least one tick")]
    ZeroLightPeriod,
    #[error("intersection ({0}, {1}) has no outgoing road")]
    NoOutgoing(usize, usize),
    #[error("intersection ({0}, {1}) has no incoming road")]
    NoIncoming(usize, usize),
    #[error("the road entering ({0}, {1}) at the {2:?} side has no lane")]
    NoLanes(usize, usize, Direction),
    #[error("the road leaving ({0}, {1}) towards {2:?} is not fed by any lane")]
    UnreachableRoad(usize, usize, Direction),
}

/// Builds randomised road networks that every vehicle can traverse.
///
/// Construction runs a sequence of passes that only ever add roads and
/// lanes: random seeding, minimum connectivity, dead-end repair (iterated to
/// a fixed point), random lanes, lane coverage in both directions and
/// finally traffic-light assignment from the movement-conflict relation.
pub struct GridBuilder<'a> {
    config: &'a SimConfig,
}

impl<'a> GridBuilder<'a> {
    /// Creates a builder for the given configuration.
    pub fn new(config: &'a SimConfig) -> Self {
        Self { config }
    }

    /// Builds the network and its initial vehicle population.
    pub fn build(&self, rng: &mut ChaCha8Rng) -> Result<(RoadNetwork, VehicleSet), BuildError> {
        self.validate_config()?;
        let mut network = RoadNetwork::new(
            self.config.grid_width,
            self.config.grid_height,
            self.config.light_period,
        );
        self.add_initial_roads(&mut network, rng);
        self.ensure_minimum_roads(&mut network, rng);
        self.repair_dead_ends(&mut network, rng);
        self.add_initial_lanes(&mut network, rng);
        self.ensure_lane_coverage(&mut network, rng);
        self.ensure_reachable_roads(&mut network, rng);
        self.assign_traffic_lights(&mut network);
        self.validate(&network)?;
        let vehicles = self.place_vehicles(&mut network, rng);
        Ok((network, vehicles))
    }

    fn validate_config(&self) -> Result<(), BuildError> {
        let config = self.config;
        if config.grid_width == 0 || config.grid_height == 0 {
            return Err(BuildError::EmptyGrid);
        }
        if !(0.0..=1.0).contains(&config.road_probability) {
            return Err(BuildError::InvalidProbability("road"));
        }
        if !(0.0..=1.0).contains(&config.lane_probability) {
            return Err(BuildError::InvalidProbability("lane"));
        }
        if !config.vehicle_count.is_valid() {
            return Err(BuildError::InvalidRange("vehicle count"));
        }
        if !config.trip_roads.is_valid() {
            return Err(BuildError::InvalidRange("trip length"));
        }
        if config.trip_roads.min == 0 {
            return Err(BuildError::ZeroTripLength);
        }
        if config.light_period == 0 {
            return Err(BuildError::ZeroLightPeriod);
        }
        Ok(())
    }

    /// Adds a road towards each neighbour with the configured probability.
    fn add_initial_roads(&self, network: &mut RoadNetwork, rng: &mut ChaCha8Rng) {
        for id in intersection_ids(network) {
            for direction in Direction::ALL {
                if network.neighbour(id, direction).is_some()
                    && rng.gen_bool(self.config.road_probability)
                {
                    network.add_road(id, direction, self.config.road_length);
                }
            }
        }
        debug!("seeded {} random roads", network.num_roads());
    }

    /// Gives every intersection at least one outgoing and one incoming road.
    fn ensure_minimum_roads(&self, network: &mut RoadNetwork, rng: &mut ChaCha8Rng) {
        let ids = intersection_ids(network);
        for &id in &ids {
            if network.intersection(id).outgoing_roads().next().is_none() {
                if let Some(&direction) = valid_directions(network, id).choose(rng) {
                    trace!("adding outgoing road at {:?}", network.intersection(id).position());
                    network.add_road(id, direction, self.config.road_length);
                }
            }
        }
        for &id in &ids {
            if network.intersection(id).incoming_roads().next().is_none() {
                if let Some(&direction) = valid_directions(network, id).choose(rng) {
                    trace!("adding incoming road at {:?}", network.intersection(id).position());
                    let neighbour = network.neighbour(id, direction).unwrap();
                    network.add_road(neighbour, direction.opposite(), self.config.road_length);
                }
            }
        }
    }

    /// Repairs intersections that can only be left or entered through the
    /// side a road already occupies.
    ///
    /// No turning reaches the side a vehicle came in on, so an incoming road
    /// needs an outgoing road on a different side and vice versa. Each fix
    /// can violate the constraint at a neighbour, so the pass repeats until
    /// it adds nothing.
    fn repair_dead_ends(&self, network: &mut RoadNetwork, rng: &mut ChaCha8Rng) {
        let ids = intersection_ids(network);
        loop {
            let mut added = 0;
            for &id in &ids {
                for side in Direction::ALL {
                    if network.intersection(id).incoming(side).is_some()
                        && !network.intersection(id).has_outgoing_besides(side)
                    {
                        let choices: ArrayVec<Direction, 4> = valid_directions(network, id)
                            .into_iter()
                            .filter(|d| *d != side && network.intersection(id).outgoing(*d).is_none())
                            .collect();
                        if let Some(&direction) = choices.choose(rng) {
                            trace!(
                                "adding escape road at {:?}",
                                network.intersection(id).position()
                            );
                            network.add_road(id, direction, self.config.road_length);
                            added += 1;
                        }
                    }
                    if network.intersection(id).outgoing(side).is_some()
                        && !network.intersection(id).has_incoming_besides(side)
                    {
                        let choices: ArrayVec<Direction, 4> = valid_directions(network, id)
                            .into_iter()
                            .filter(|d| *d != side && network.intersection(id).incoming(*d).is_none())
                            .collect();
                        if let Some(&direction) = choices.choose(rng) {
                            trace!(
                                "adding feeder road at {:?}",
                                network.intersection(id).position()
                            );
                            let neighbour = network.neighbour(id, direction).unwrap();
                            network.add_road(neighbour, direction.opposite(), self.config.road_length);
                            added += 1;
                        }
                    }
                }
            }
            if added == 0 {
                break;
            }
            debug!("dead-end repair added {} roads", added);
        }
    }

    /// Adds a lane for each legal turning with the configured probability.
    fn add_initial_lanes(&self, network: &mut RoadNetwork, rng: &mut ChaCha8Rng) {
        for road_id in road_ids(network) {
            for turning in Turning::ALL {
                if network.turn_target(road_id, turning).is_some()
                    && rng.gen_bool(self.config.lane_probability)
                {
                    network.add_lane(road_id, turning);
                }
            }
        }
        debug!("seeded {} random lanes", network.num_lanes());
    }

    /// Gives every road at least one lane.
    fn ensure_lane_coverage(&self, network: &mut RoadNetwork, rng: &mut ChaCha8Rng) {
        for road_id in road_ids(network) {
            if network.road(road_id).num_lanes() > 0 {
                continue;
            }
            let legal: ArrayVec<Turning, 3> = Turning::ALL
                .into_iter()
                .filter(|t| network.turn_target(road_id, *t).is_some())
                .collect();
            if let Some(&turning) = legal.choose(rng) {
                network.add_lane(road_id, turning);
            }
        }
    }

    /// Makes every outgoing road reachable from at least one lane.
    fn ensure_reachable_roads(&self, network: &mut RoadNetwork, rng: &mut ChaCha8Rng) {
        for id in intersection_ids(network) {
            let outgoing: ArrayVec<RoadId, 4> =
                network.intersection(id).outgoing_roads().collect();
            for road_out in outgoing {
                let reachable = network
                    .intersection(id)
                    .incoming_roads()
                    .flat_map(|r| network.road(r).lanes())
                    .any(|lane| network.lane(lane).road_out() == road_out);
                if reachable {
                    continue;
                }
                let candidates: ArrayVec<(RoadId, Turning), 4> = network
                    .intersection(id)
                    .incoming_roads()
                    .filter_map(|road_in| {
                        Turning::ALL
                            .into_iter()
                            .find(|t| network.turn_target(road_in, *t) == Some(road_out))
                            .map(|t| (road_in, t))
                    })
                    .collect();
                if let Some(&(road_in, turning)) = candidates.choose(rng) {
                    network.add_lane(road_in, turning);
                }
            }
        }
    }

    /// Marks the lanes that cannot share a green light.
    fn assign_traffic_lights(&self, network: &mut RoadNetwork) {
        let mut lighted = 0;
        for id in intersection_ids(network) {
            let conflicted: Vec<LaneId> = network
                .lanes_at(id)
                .into_iter()
                .tuple_combinations()
                .filter(|(a, b)| {
                    !compatible(network.lane(*a).movement(), network.lane(*b).movement())
                })
                .flat_map(|(a, b)| [a, b])
                .collect();
            if conflicted.is_empty() {
                continue;
            }
            network.intersection_mut(id).mark_traffic_lights();
            for lane in conflicted {
                network.lane_mut(lane).mark_traffic_light();
            }
            lighted += 1;
        }
        debug!("{} intersections are light controlled", lighted);
    }

    /// Checks the construction invariants the repair passes should have
    /// established.
    fn validate(&self, network: &RoadNetwork) -> Result<(), BuildError> {
        for (_, intersection) in network.iter_intersections() {
            let (x, y) = intersection.position();
            if intersection.outgoing_roads().next().is_none() {
                return Err(BuildError::NoOutgoing(x, y));
            }
            if intersection.incoming_roads().next().is_none() {
                return Err(BuildError::NoIncoming(x, y));
            }
        }
        for (road_id, road) in network.iter_roads() {
            if road.num_lanes() == 0 {
                let (x, y) = network.intersection(road.destination()).position();
                return Err(BuildError::NoLanes(x, y, road.end_direction()));
            }
            let reachable = network
                .intersection(road.origin())
                .incoming_roads()
                .flat_map(|r| network.road(r).lanes())
                .any(|lane| network.lane(lane).road_out() == road_id);
            if !reachable {
                let (x, y) = network.intersection(road.origin()).position();
                return Err(BuildError::UnreachableRoad(
                    x,
                    y,
                    road.end_direction().opposite(),
                ));
            }
        }
        Ok(())
    }

    /// Queues each vehicle in a uniformly random lane of a uniformly random
    /// intersection, with a uniformly random trip length.
    fn place_vehicles(&self, network: &mut RoadNetwork, rng: &mut ChaCha8Rng) -> VehicleSet {
        let mut vehicles = VehicleSet::default();
        let count = self.config.vehicle_count.sample(rng);
        let ids = intersection_ids(network);
        for _ in 0..count {
            let at = *ids.choose(rng).expect("grid is empty");
            let lane_id = *network.lanes_at(at).choose(rng).expect("no lanes to start in");
            let trip = self.config.trip_roads.sample(rng);
            let lighted = network.lane(lane_id).has_traffic_light();
            let vehicle = vehicles.insert_with_key(|id| Vehicle::new(id, trip, lane_id, lighted));
            network.lane_mut(lane_id).enter(vehicle);
        }
        debug!("placed {} vehicles", count);
        vehicles
    }
}

fn intersection_ids(network: &RoadNetwork) -> Vec<IntersectionId> {
    network.iter_intersections().map(|(id, _)| id).collect()
}

fn road_ids(network: &RoadNetwork) -> Vec<RoadId> {
    network.iter_roads().map(|(id, _)| id).collect()
}

fn valid_directions(network: &RoadNetwork, id: IntersectionId) -> ArrayVec<Direction, 4> {
    Direction::ALL
        .into_iter()
        .filter(|d| network.neighbour(id, *d).is_some())
        .collect()
}
